use actix_web::body::MessageBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::error::ErrorInternalServerError;
use actix_web::http::header::{
    HeaderMap, HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ORIGIN, VARY,
};
use actix_web::middleware::Next;
use actix_web::web::Data;
use std::sync::Arc;

pub(crate) const ALLOWED_ORIGINS: &[&str] = &["https://harshitappq.onrender.com"];

const ALLOWED_HEADERS: &str = "Content-Type, Authorization";
const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";

/// Exact-match origin allow-list. Disallowed callers are still served; they
/// just get no `Access-Control-Allow-Origin`, and the browser enforces the rest.
#[derive(Debug, Clone)]
pub(crate) struct CorsPolicy {
    allowed_origins: Arc<[String]>,
}

impl CorsPolicy {
    pub fn new<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_origins: origins.into_iter().map(Into::into).collect(),
        }
    }

    pub fn allows(&self, origin: &HeaderValue) -> bool {
        self.allowed_origins.iter().any(|o| o.as_bytes() == origin.as_bytes())
    }

    pub fn apply(&self, origin: Option<&HeaderValue>, headers: &mut HeaderMap) {
        if let Some(origin) = origin.filter(|o| self.allows(o)) {
            headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
        }
        if !varies_on_origin(headers) {
            headers.append(VARY, HeaderValue::from_static("Origin"));
        }
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOWED_HEADERS));
        headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOWED_METHODS));
    }
}

fn varies_on_origin(headers: &HeaderMap) -> bool {
    headers.get_all(VARY).any(|v| {
        v.to_str()
            .map(|v| v.split(',').any(|name| name.trim().eq_ignore_ascii_case("origin")))
            .unwrap_or(false)
    })
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self::new(ALLOWED_ORIGINS.iter().copied())
    }
}

/// Middleware applying the registered `CorsPolicy` to every response, error
/// responses included. The policy must be registered as app data.
pub(crate) async fn cors_gate(req: ServiceRequest, next: Next<impl MessageBody>) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    let origin = req.headers().get(ORIGIN).cloned();
    let policy = req
        .app_data::<Data<CorsPolicy>>()
        .cloned()
        .ok_or_else(|| ErrorInternalServerError("cors policy is not registered"))?;
    let mut res = next.call(req).await?;
    policy.apply(origin.as_ref(), res.headers_mut());
    Ok(res)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::handlers::configure;
    use crate::persisters::MemoryPersister;
    use actix_web::dev::Service;
    use actix_web::http::header::ContentType;
    use actix_web::http::StatusCode;
    use actix_web::middleware::from_fn;
    use actix_web::test::{call_service, init_service, read_body, TestRequest};
    use actix_web::App;

    #[test]
    fn test_apply_allowed_origin() {
        let policy = CorsPolicy::default();
        let origin = HeaderValue::from_static("https://harshitappq.onrender.com");
        let mut headers = HeaderMap::new();
        policy.apply(Some(&origin), &mut headers);
        assert_eq!(headers.get(ACCESS_CONTROL_ALLOW_ORIGIN), Some(&origin));
        assert_eq!(headers.get(VARY).unwrap(), "Origin");
        assert_eq!(headers.get(ACCESS_CONTROL_ALLOW_HEADERS).unwrap(), "Content-Type, Authorization");
        assert_eq!(headers.get(ACCESS_CONTROL_ALLOW_METHODS).unwrap(), "GET, POST, OPTIONS");
    }

    #[test]
    fn test_apply_disallowed_or_missing_origin() {
        let policy = CorsPolicy::default();
        for origin in [Some(HeaderValue::from_static("https://evil.example")), None] {
            let mut headers = HeaderMap::new();
            policy.apply(origin.as_ref(), &mut headers);
            assert!(headers.get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
            assert_eq!(headers.get(VARY).unwrap(), "Origin");
        }
    }

    #[test]
    fn test_vary_is_merged() {
        let policy = CorsPolicy::default();
        let mut headers = HeaderMap::new();
        headers.insert(VARY, HeaderValue::from_static("Accept-Encoding"));
        policy.apply(None, &mut headers);
        let vary: Vec<_> = headers.get_all(VARY).collect();
        assert_eq!(vary, vec!["Accept-Encoding", "Origin"]);

        let mut headers = HeaderMap::new();
        headers.insert(VARY, HeaderValue::from_static("Accept, origin"));
        policy.apply(None, &mut headers);
        let vary: Vec<_> = headers.get_all(VARY).collect();
        assert_eq!(vary, vec!["Accept, origin"]);
    }

    #[test]
    fn test_only_listed_origin_is_allowed() {
        let policy = CorsPolicy::default();
        assert!(policy.allows(&HeaderValue::from_static("https://harshitappq.onrender.com")));
        assert!(!policy.allows(&HeaderValue::from_static("http://localhost:5000")));
    }

    #[actix_web::test]
    async fn test_gate_requires_registered_policy() {
        let app = init_service(
            App::new()
                .app_data(Data::new(MemoryPersister::default()))
                .wrap(from_fn(cors_gate))
                .configure(configure::<MemoryPersister>),
        )
        .await;
        let req = TestRequest::get().uri("/api/locations").to_request();
        let res = app.call(req).await;
        assert!(res.is_err());
    }

    #[test]
    fn test_match_is_exact() {
        let policy = CorsPolicy::new(["https://a.example"]);
        assert!(policy.allows(&HeaderValue::from_static("https://a.example")));
        assert!(!policy.allows(&HeaderValue::from_static("https://a.example/")));
        assert!(!policy.allows(&HeaderValue::from_static("HTTPS://A.EXAMPLE")));
        assert!(!policy.allows(&HeaderValue::from_static("https://a.example.evil")));
    }

    #[actix_web::test]
    async fn test_gate_on_api_responses() {
        let app = init_service(
            App::new()
                .app_data(Data::new(MemoryPersister::default()))
                .app_data(Data::new(CorsPolicy::default()))
                .wrap(from_fn(cors_gate))
                .configure(configure::<MemoryPersister>),
        )
        .await;

        let req = TestRequest::get()
            .uri("/api/locations")
            .insert_header((ORIGIN, "https://harshitappq.onrender.com"))
            .to_request();
        let res = call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "https://harshitappq.onrender.com");

        let req = TestRequest::post()
            .uri("/api/locations")
            .insert_header((ORIGIN, "https://evil.example"))
            .insert_header(ContentType::json())
            .set_payload(r#"{"name": "Cafe", "lat": 12.9, "lng": 77.6}"#)
            .to_request();
        let res = call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        assert!(res.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
        assert_eq!(res.headers().get(VARY).unwrap(), "Origin");

        let req = TestRequest::post()
            .uri("/api/locations")
            .insert_header((ORIGIN, "https://harshitappq.onrender.com"))
            .insert_header(ContentType::json())
            .set_payload("{}")
            .to_request();
        let res = call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(res.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "https://harshitappq.onrender.com");
    }

    #[actix_web::test]
    async fn test_preflight() {
        let app = init_service(
            App::new()
                .app_data(Data::new(MemoryPersister::default()))
                .app_data(Data::new(CorsPolicy::default()))
                .wrap(from_fn(cors_gate))
                .configure(configure::<MemoryPersister>),
        )
        .await;
        let req = TestRequest::default()
            .method(actix_web::http::Method::OPTIONS)
            .uri("/api/locations")
            .insert_header((ORIGIN, "https://harshitappq.onrender.com"))
            .to_request();
        let res = call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
        assert_eq!(res.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "https://harshitappq.onrender.com");
        assert_eq!(res.headers().get(ACCESS_CONTROL_ALLOW_METHODS).unwrap(), "GET, POST, OPTIONS");
        assert!(read_body(res).await.is_empty());
    }
}
