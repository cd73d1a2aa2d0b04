use crate::cli::GlobalArgs;

#[derive(Clone)]
pub struct State {
    pub global: GlobalArgs,
}

impl State {
    pub fn new(global: GlobalArgs) -> Self {
        Self { global }
    }
}
