use axum::{
    extract::Request,
    http::{
        HeaderValue,
        header::{CACHE_CONTROL, PRAGMA},
    },
    middleware::Next,
    response::Response,
};

/// Marks every response, errors included, as uncacheable.
pub async fn no_store(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_static("no-store, no-cache, must-revalidate, max-age=0"),
    );
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    response
}
