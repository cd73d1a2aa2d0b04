use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use doit_models::{FloatingIp, FloatingIpCreateRequest, FloatingIps};
use reqwest::{
    StatusCode,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use serde::Deserialize;
use tokio::sync::OnceCell;
use url::Url;

use crate::user_config::{ACCESS_TOKEN_KEY, API_URL_KEY, UserConfigService};

use super::FloatingIpsContract;

pub const DEFAULT_API_URL: &str = "https://api.digitalocean.com";
const PER_PAGE: usize = 200;

/// Floating IPs backed by the DigitalOcean v2 REST API.
pub struct DigitalOceanFloatingIps {
    access_token: Option<String>,
    api_url: Option<String>,
    user_config: UserConfigService,

    api: OnceCell<Api>,
}

impl DigitalOceanFloatingIps {
    pub fn new(
        access_token: Option<String>,
        api_url: Option<String>,
        user_config: UserConfigService,
    ) -> Self {
        Self {
            access_token,
            api_url,
            user_config,
            api: OnceCell::const_new(),
        }
    }

    // token and url are resolved on the first call
    async fn api(&self) -> anyhow::Result<&Api> {
        self.api
            .get_or_try_init(|| async move {
                let user_config = self.user_config.get_user_config().await?;

                let access_token = self
                    .access_token
                    .clone()
                    .or_else(|| user_config.user.get(ACCESS_TOKEN_KEY).cloned())
                    .filter(|t| !t.is_empty())
                    .context(
                        "no access token found, pass --access-token, set DIGITALOCEAN_ACCESS_TOKEN \
                         or run `doit config set access-token <token>`",
                    )?;

                let api_url = self
                    .api_url
                    .clone()
                    .or_else(|| user_config.user.get(API_URL_KEY).cloned())
                    .unwrap_or_else(|| DEFAULT_API_URL.into());

                tracing::trace!(%api_url, "creating api client");

                Api::new(&api_url, &access_token)
            })
            .await
    }
}

#[async_trait]
impl FloatingIpsContract for DigitalOceanFloatingIps {
    #[tracing::instrument(skip(self), level = "trace")]
    async fn create(&self, request: &FloatingIpCreateRequest) -> anyhow::Result<FloatingIp> {
        let api = self.api().await?;

        let resp = api
            .client
            .post(api.floating_ips_url(None)?)
            .json(request)
            .send()
            .await
            .context("create floating ip")?;

        let root: FloatingIpRoot = ensure_success(resp)
            .await?
            .json()
            .await
            .context("decode floating ip")?;

        Ok(root.floating_ip)
    }

    #[tracing::instrument(skip(self), level = "trace")]
    async fn get(&self, ip: &str) -> anyhow::Result<FloatingIp> {
        let api = self.api().await?;

        let resp = api
            .client
            .get(api.floating_ips_url(Some(ip))?)
            .send()
            .await
            .context("get floating ip")?;

        let root: FloatingIpRoot = ensure_success(resp)
            .await?
            .json()
            .await
            .context("decode floating ip")?;

        Ok(root.floating_ip)
    }

    #[tracing::instrument(skip(self), level = "trace")]
    async fn delete(&self, ip: &str) -> anyhow::Result<()> {
        let api = self.api().await?;

        let resp = api
            .client
            .delete(api.floating_ips_url(Some(ip))?)
            .send()
            .await
            .context("delete floating ip")?;

        ensure_success(resp).await?;

        Ok(())
    }

    #[tracing::instrument(skip(self), level = "trace")]
    async fn list(&self) -> anyhow::Result<FloatingIps> {
        let api = self.api().await?;

        let mut url = api.floating_ips_url(None)?;
        url.query_pairs_mut()
            .append_pair("page", "1")
            .append_pair("per_page", &PER_PAGE.to_string());

        let mut ips = Vec::new();
        loop {
            tracing::debug!(%url, "fetching floating ip page");

            let resp = api
                .client
                .get(url.clone())
                .send()
                .await
                .context("list floating ips")?;

            let page: FloatingIpsPage = ensure_success(resp)
                .await?
                .json()
                .await
                .context("decode floating ips")?;

            let next = page.next_page()?;
            ips.extend(page.floating_ips);

            match next {
                Some(next) if next != url => url = next,
                _ => break,
            }
        }

        Ok(ips.into())
    }
}

struct Api {
    base_url: Url,
    client: reqwest::Client,
}

impl Api {
    fn new(api_url: &str, access_token: &str) -> anyhow::Result<Self> {
        Self::from_builder(reqwest::Client::builder(), api_url, access_token)
    }

    fn from_builder(
        builder: reqwest::ClientBuilder,
        api_url: &str,
        access_token: &str,
    ) -> anyhow::Result<Self> {
        let base_url = Url::parse(api_url).context(format!("invalid api url: {api_url}"))?;

        let mut authorization = HeaderValue::from_str(&format!("Bearer {access_token}"))
            .context("access token contains invalid characters")?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, authorization);

        let client = builder
            .user_agent(concat!("doit/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build http client")?;

        Ok(Self { base_url, client })
    }

    fn floating_ips_url(&self, ip: Option<&str>) -> anyhow::Result<Url> {
        let mut url = self.base_url.clone();

        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                anyhow::anyhow!("api url cannot be used as a base: {}", self.base_url)
            })?;

            segments.pop_if_empty().extend(["v2", "floating_ips"]);
            if let Some(ip) = ip {
                segments.push(ip);
            }
        }

        Ok(url)
    }
}

#[derive(Deserialize)]
struct FloatingIpRoot {
    floating_ip: FloatingIp,
}

#[derive(Deserialize)]
struct FloatingIpsPage {
    floating_ips: Vec<FloatingIp>,

    #[serde(default)]
    links: Links,
}

impl FloatingIpsPage {
    fn next_page(&self) -> anyhow::Result<Option<Url>> {
        self.links
            .pages
            .next
            .as_deref()
            .map(Url::parse)
            .transpose()
            .context("invalid next page link")
    }
}

#[derive(Deserialize, Default)]
struct Links {
    #[serde(default)]
    pages: Pages,
}

#[derive(Deserialize, Default)]
struct Pages {
    next: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: String,
}

async fn ensure_success(resp: reqwest::Response) -> anyhow::Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();

    Err(api_error(status, &body))
}

fn api_error(status: StatusCode, body: &str) -> anyhow::Error {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(err) if !err.message.is_empty() => anyhow::anyhow!("{}: {}", status, err.message),
        _ => anyhow::anyhow!("{}", status),
    }
}

#[cfg(test)]
mod test {
    use std::{
        collections::BTreeMap,
        sync::{Arc, Mutex},
    };

    use tokio::{
        io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader},
        net::{TcpListener, TcpStream},
        task::JoinHandle,
    };

    use super::*;
    use crate::user_locations::UserLocations;

    #[derive(Clone)]
    struct Route {
        method: &'static str,
        target: String,
        status: u16,
        body: String,
    }

    impl Route {
        fn new(method: &'static str, target: &str, status: u16, body: &str) -> Self {
            Self {
                method,
                target: target.into(),
                status,
                body: body.into(),
            }
        }
    }

    #[derive(Clone, Debug, PartialEq)]
    struct ReceivedRequest {
        method: String,
        target: String,
        authorization: Option<String>,
        body: String,
    }

    /// Minimal HTTP/1.1 server answering canned responses, one request per connection.
    struct TestApi {
        base_url: String,
        received: Arc<Mutex<Vec<ReceivedRequest>>>,
        handle: JoinHandle<()>,
    }

    impl TestApi {
        async fn start(routes: impl FnOnce(&str) -> Vec<Route>) -> anyhow::Result<Self> {
            let listener = TcpListener::bind("127.0.0.1:0").await?;
            let base_url = format!("http://{}", listener.local_addr()?);
            let routes = Arc::new(routes(&base_url));
            let received = Arc::new(Mutex::new(Vec::new()));

            let handle = tokio::spawn({
                let received = received.clone();
                async move {
                    while let Ok((stream, _)) = listener.accept().await {
                        let routes = routes.clone();
                        let received = received.clone();
                        tokio::spawn(async move {
                            if let Err(e) = respond(stream, &routes, &received).await {
                                eprintln!("test api failed to respond: {e:?}");
                            }
                        });
                    }
                }
            });

            Ok(Self {
                base_url,
                received,
                handle,
            })
        }

        fn client(&self) -> anyhow::Result<DigitalOceanFloatingIps> {
            let api = Api::from_builder(
                reqwest::Client::builder().no_proxy(),
                &self.base_url,
                "test-token",
            )?;

            Ok(DigitalOceanFloatingIps {
                access_token: None,
                api_url: None,
                user_config: UserConfigService::new(UserLocations::default()),
                api: OnceCell::new_with(Some(api)),
            })
        }

        fn received(&self) -> Vec<ReceivedRequest> {
            self.received.lock().unwrap().clone()
        }
    }

    impl Drop for TestApi {
        fn drop(&mut self) {
            self.handle.abort();
        }
    }

    async fn respond(
        stream: TcpStream,
        routes: &[Route],
        received: &Mutex<Vec<ReceivedRequest>>,
    ) -> anyhow::Result<()> {
        let mut reader = BufReader::new(stream);

        let mut request_line = String::new();
        reader.read_line(&mut request_line).await?;
        let mut parts = request_line.split_whitespace();
        let method = parts.next().unwrap_or_default().to_string();
        let target = parts.next().unwrap_or_default().to_string();

        let mut headers = BTreeMap::new();
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).await?;
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
            }
        }

        let length = headers
            .get("content-length")
            .map(|l| l.parse::<usize>())
            .transpose()?
            .unwrap_or_default();
        let mut body = vec![0; length];
        reader.read_exact(&mut body).await?;

        let (status, response_body) = routes
            .iter()
            .find(|r| r.method == method && r.target == target)
            .map(|r| (r.status, r.body.clone()))
            .unwrap_or((404, String::new()));

        received.lock().unwrap().push(ReceivedRequest {
            method,
            target,
            authorization: headers.get("authorization").cloned(),
            body: String::from_utf8(body)?,
        });

        let reason = StatusCode::from_u16(status)?
            .canonical_reason()
            .unwrap_or_default();
        let response = format!(
            "HTTP/1.1 {status} {reason}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{response_body}",
            response_body.len()
        );

        let mut stream = reader.into_inner();
        stream.write_all(response.as_bytes()).await?;
        stream.shutdown().await?;

        Ok(())
    }

    fn floating_ip_json(ip: &str, region: &str) -> String {
        format!(r#"{{ "ip": "{ip}", "droplet": null, "region": {{ "slug": "{region}" }}, "locked": false }}"#)
    }

    const FIRST_PAGE: &str = "/v2/floating_ips?page=1&per_page=200";

    #[tokio::test]
    async fn list_concatenates_pages_in_server_order() -> anyhow::Result<()> {
        let api = TestApi::start(|base| {
            vec![
                Route::new(
                    "GET",
                    FIRST_PAGE,
                    200,
                    &format!(
                        r#"{{ "floating_ips": [{}, {}], "links": {{ "pages": {{ "next": "{base}/v2/floating_ips?page=2&per_page=200" }} }} }}"#,
                        floating_ip_json("10.0.0.1", "nyc1"),
                        floating_ip_json("10.0.0.2", "ams3"),
                    ),
                ),
                Route::new(
                    "GET",
                    "/v2/floating_ips?page=2&per_page=200",
                    200,
                    &format!(
                        r#"{{ "floating_ips": [{}], "links": {{}} }}"#,
                        floating_ip_json("10.0.0.3", "nyc1"),
                    ),
                ),
            ]
        })
        .await?;

        let ips = api.client()?.list().await?;

        let order = ips.iter().map(|i| i.ip.as_str()).collect::<Vec<_>>();
        assert_eq!(vec!["10.0.0.1", "10.0.0.2", "10.0.0.3"], order);

        let received = api.received();
        assert_eq!(
            vec![FIRST_PAGE, "/v2/floating_ips?page=2&per_page=200"],
            received.iter().map(|r| r.target.as_str()).collect::<Vec<_>>()
        );
        assert!(
            received
                .iter()
                .all(|r| r.authorization.as_deref() == Some("Bearer test-token"))
        );

        Ok(())
    }

    #[tokio::test]
    async fn list_stops_when_next_link_points_at_the_same_page() -> anyhow::Result<()> {
        let api = TestApi::start(|base| {
            vec![Route::new(
                "GET",
                FIRST_PAGE,
                200,
                &format!(
                    r#"{{ "floating_ips": [{}], "links": {{ "pages": {{ "next": "{base}{FIRST_PAGE}" }} }} }}"#,
                    floating_ip_json("10.0.0.1", "nyc1"),
                ),
            )]
        })
        .await?;

        let ips = api.client()?.list().await?;

        assert_eq!(1, ips.len());
        assert_eq!(1, api.received().len());

        Ok(())
    }

    #[tokio::test]
    async fn create_posts_only_the_locator() -> anyhow::Result<()> {
        let api = TestApi::start(|_| {
            vec![Route::new(
                "POST",
                "/v2/floating_ips",
                202,
                &format!(r#"{{ "floating_ip": {} }}"#, floating_ip_json("10.0.0.9", "nyc3")),
            )]
        })
        .await?;

        let ip = api
            .client()?
            .create(&FloatingIpCreateRequest::in_region("nyc3"))
            .await?;

        assert_eq!("10.0.0.9", ip.ip);
        assert_eq!("nyc3", ip.region_slug());

        let received = api.received();
        assert_eq!(1, received.len());
        assert_eq!("POST", received[0].method);
        assert_eq!(
            serde_json::json!({ "region": "nyc3" }),
            serde_json::from_str::<serde_json::Value>(&received[0].body)?
        );

        Ok(())
    }

    #[tokio::test]
    async fn delete_accepts_no_content() -> anyhow::Result<()> {
        let api = TestApi::start(|_| {
            vec![Route::new("DELETE", "/v2/floating_ips/10.0.0.9", 204, "")]
        })
        .await?;

        api.client()?.delete("10.0.0.9").await?;

        let received = api.received();
        assert_eq!(1, received.len());
        assert_eq!("DELETE", received[0].method);
        assert_eq!(Some("Bearer test-token"), received[0].authorization.as_deref());

        Ok(())
    }

    #[tokio::test]
    async fn get_reports_the_api_error_message() -> anyhow::Result<()> {
        let api = TestApi::start(|_| {
            vec![Route::new(
                "GET",
                "/v2/floating_ips/10.0.0.9",
                404,
                r#"{"id":"not_found","message":"The resource you were accessing could not be found."}"#,
            )]
        })
        .await?;

        let err = api.client()?.get("10.0.0.9").await.unwrap_err();

        assert_eq!(
            "404 Not Found: The resource you were accessing could not be found.",
            err.to_string()
        );

        Ok(())
    }

    #[tokio::test]
    async fn get_decodes_the_floating_ip() -> anyhow::Result<()> {
        let api = TestApi::start(|_| {
            vec![Route::new(
                "GET",
                "/v2/floating_ips/10.0.0.9",
                200,
                r#"{ "floating_ip": { "ip": "10.0.0.9", "droplet": { "id": 42, "name": "web-1" }, "region": { "slug": "ams3" }, "locked": true } }"#,
            )]
        })
        .await?;

        let ip = api.client()?.get("10.0.0.9").await?;

        assert_eq!(Some(42), ip.droplet.as_ref().map(|d| d.id));
        assert!(ip.locked);

        Ok(())
    }

    #[test]
    fn urls_are_built_below_the_api_root() -> anyhow::Result<()> {
        let api = Api::new(DEFAULT_API_URL, "token")?;

        assert_eq!(
            "https://api.digitalocean.com/v2/floating_ips",
            api.floating_ips_url(None)?.as_str()
        );
        assert_eq!(
            "https://api.digitalocean.com/v2/floating_ips/45.55.96.47",
            api.floating_ips_url(Some("45.55.96.47"))?.as_str()
        );

        Ok(())
    }

    #[test]
    fn urls_keep_a_path_prefix() -> anyhow::Result<()> {
        let api = Api::new("http://localhost:8080/proxy/", "token")?;

        assert_eq!(
            "http://localhost:8080/proxy/v2/floating_ips/10.0.0.1",
            api.floating_ips_url(Some("10.0.0.1"))?.as_str()
        );

        Ok(())
    }

    #[test]
    fn invalid_api_url_is_rejected() {
        assert!(Api::new("not a url", "token").is_err());
    }

    #[test]
    fn can_parse_last_page() -> anyhow::Result<()> {
        let page: FloatingIpsPage = serde_json::from_str(
            r#"{
                "floating_ips": [
                    { "ip": "45.55.96.47", "droplet": null, "region": { "slug": "nyc3" }, "locked": false }
                ],
                "links": {},
                "meta": { "total": 1 }
            }"#,
        )?;

        assert_eq!(1, page.floating_ips.len());
        assert_eq!(None, page.next_page()?);

        Ok(())
    }

    #[test]
    fn can_follow_next_page_link() -> anyhow::Result<()> {
        let page: FloatingIpsPage = serde_json::from_str(
            r#"{
                "floating_ips": [],
                "links": {
                    "pages": {
                        "last": "https://api.digitalocean.com/v2/floating_ips?page=3&per_page=200",
                        "next": "https://api.digitalocean.com/v2/floating_ips?page=2&per_page=200"
                    }
                }
            }"#,
        )?;

        assert_eq!(
            Some(Url::parse(
                "https://api.digitalocean.com/v2/floating_ips?page=2&per_page=200"
            )?),
            page.next_page()?
        );

        Ok(())
    }

    #[test]
    fn api_errors_carry_the_message() {
        let err = api_error(
            StatusCode::NOT_FOUND,
            r#"{"id":"not_found","message":"The resource you were accessing could not be found."}"#,
        );

        assert_eq!(
            "404 Not Found: The resource you were accessing could not be found.",
            err.to_string()
        );
    }

    #[test]
    fn api_errors_without_body_fall_back_to_status() {
        let err = api_error(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");

        assert_eq!("502 Bad Gateway", err.to_string());
    }

    #[tokio::test]
    async fn missing_access_token_is_reported_on_first_use() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let client = DigitalOceanFloatingIps::new(
            None,
            None,
            UserConfigService::new(UserLocations::with_config_dir(dir.path())),
        );

        let err = client.list().await.unwrap_err();

        assert!(err.to_string().starts_with("no access token found"));

        Ok(())
    }

    #[tokio::test]
    async fn access_token_falls_back_to_user_config() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        tokio::fs::write(
            dir.path().join("doit.toml"),
            "[user]\naccess-token = \"from-file\"\napi-url = \"http://localhost:1/\"\n",
        )
        .await?;

        let client = DigitalOceanFloatingIps::new(
            None,
            None,
            UserConfigService::new(UserLocations::with_config_dir(dir.path())),
        );

        let api = client.api().await?;

        assert_eq!("http://localhost:1/", api.base_url.as_str());

        Ok(())
    }
}
