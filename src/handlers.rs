use crate::core::{self, Persister};
use crate::error::Error;
use crate::models::{AddLocationResponse, LocationView};
use actix_web::http::header::{ContentType, HeaderValue, CONTENT_TYPE};
use actix_web::http::Method;
use actix_web::web::{self, Bytes, Data, Json, ServiceConfig};
use actix_web::{HttpRequest, HttpResponse};
use serde_json::{Map, Value};

const INDEX_HTML: &str = include_str!("../static/index.html");

pub(crate) fn configure<P>(cfg: &mut ServiceConfig)
where
    P: Persister + 'static,
{
    cfg.route("/", web::get().to(index)).service(
        web::resource("/api/locations")
            .route(web::get().to(list_locations::<P>))
            .route(web::post().to(add_location::<P>))
            .route(web::method(Method::OPTIONS).to(preflight)),
    );
}

pub(crate) async fn index() -> HttpResponse {
    HttpResponse::Ok().content_type(ContentType::html()).body(INDEX_HTML)
}

pub(crate) async fn list_locations<P>(persister: Data<P>) -> Result<Json<Vec<LocationView>>, Error>
where
    P: Persister + 'static,
{
    let rows = core::list_locations(persister.get_ref()).await?;
    Ok(Json(rows))
}

/// The body is read raw: a non-JSON content type, malformed JSON or a
/// non-object value counts as an empty payload and ends up on the usual
/// validation path.
pub(crate) async fn add_location<P>(req: HttpRequest, body: Bytes, persister: Data<P>) -> Result<HttpResponse, Error>
where
    P: Persister + 'static,
{
    let payload = parse_payload(req.headers().get(CONTENT_TYPE), &body);
    let id = core::add_location(persister.get_ref(), &payload).await?;
    Ok(HttpResponse::Created().json(AddLocationResponse { ok: true, id }))
}

pub(crate) async fn preflight() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

fn parse_payload(content_type: Option<&HeaderValue>, body: &[u8]) -> Map<String, Value> {
    if !is_json(content_type) {
        return Map::new();
    }
    match serde_json::from_slice(body) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

// application/json or any application/*+json, parameters ignored
fn is_json(content_type: Option<&HeaderValue>) -> bool {
    let mime = match content_type.and_then(|v| v.to_str().ok()) {
        Some(v) => v.split(';').next().unwrap_or_default().trim().to_ascii_lowercase(),
        None => return false,
    };
    mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
}
