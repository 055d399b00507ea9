use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, Article, Collection, StoredFile};
use tower::ServiceExt;

const BOUNDARY: &str = "mock-boundary";

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn delete(uri: &str) -> Request<String> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(String::new())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn multipart_request(method: &str, uri: &str, field: &str, content: &str) -> Request<String> {
    let body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"{field}\"; filename=\"upload.txt\"\r\n\
         Content-Type: text/plain\r\n\r\n\
         {content}\r\n\
         --{BOUNDARY}--\r\n"
    );
    Request::builder()
        .method(method)
        .uri(uri)
        .header(
            http::header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(body)
        .unwrap()
}

// --- articles ---

#[tokio::test]
async fn find_articles_empty() {
    let resp = app().oneshot(get("/demo/articles")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let page: Collection<Article> = body_json(resp).await;
    assert!(page.item.is_empty());
    assert_eq!(page.page, 1);
    assert_eq!(page.records_per_page, 10);
    assert_eq!(page.total_records, 0);
}

#[tokio::test]
async fn routes_outside_application_are_not_found() {
    let resp = app().oneshot(get("/articles")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_article_derives_slug() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/demo/articles",
            r#"{"title":"Hello World"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let article: Article = body_json(resp).await;
    assert_eq!(article.slug, "hello-world");
    assert_eq!(article.title, "Hello World");
}

#[tokio::test]
async fn create_article_malformed_json_returns_422() {
    let resp = app()
        .oneshot(json_request("POST", "/demo/articles", r#"{"slug":"x"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn get_article_not_found() {
    let resp = app()
        .oneshot(get("/demo/articles/missing-slug"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_article_not_found() {
    let resp = app()
        .oneshot(delete("/demo/articles/00000000-0000-0000-0000-000000000000"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_article_not_found() {
    let resp = app()
        .oneshot(json_request(
            "PUT",
            "/demo/articles/missing",
            r#"{"title":"Nope"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn find_articles_huge_page_is_empty() {
    let resp = app()
        .oneshot(get("/demo/articles?page=4294967295&rpp=4294967295"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let page: Collection<Article> = body_json(resp).await;
    assert!(page.item.is_empty());
    assert_eq!(page.page, u32::MAX);
}

// --- header echo ---

#[tokio::test]
async fn headers_route_echoes_request_headers() {
    let request = Request::builder()
        .uri("/demo/headers")
        .header(http::header::ACCEPT, "application/hal+json")
        .header(http::header::AUTHORIZATION, "Bearer token")
        .body(String::new())
        .unwrap();
    let resp = app().oneshot(request).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let headers: std::collections::HashMap<String, String> = body_json(resp).await;
    assert_eq!(headers["accept"], "application/hal+json");
    assert_eq!(headers["authorization"], "Bearer token");
}

// --- status echo ---

#[tokio::test]
async fn status_route_echoes_code() {
    let resp = app().oneshot(get("/demo/status/503")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_bytes(resp).await;
    assert_eq!(&body[..], b"status 503");
}

// --- files ---

#[tokio::test]
async fn download_missing_file_returns_404() {
    let resp = app().oneshot(get("/demo/files/none.txt")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn upload_without_file_field_returns_400() {
    let resp = app()
        .oneshot(multipart_request(
            "POST",
            "/demo/files/a.txt",
            "other",
            "hello",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn replace_missing_file_returns_404() {
    let resp = app()
        .oneshot(multipart_request("PUT", "/demo/files/a.txt", "file", "hello"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn file_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(multipart_request("POST", "/demo/files/a.txt", "file", "hello"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let stored: StoredFile = body_json(resp).await;
    assert_eq!(stored.name, "a.txt");
    assert_eq!(stored.content_type, "text/plain");
    assert_eq!(stored.size, 5);

    // same name again
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(multipart_request("POST", "/demo/files/a.txt", "file", "again"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(multipart_request("PUT", "/demo/files/a.txt", "file", "goodbye"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let stored: StoredFile = body_json(resp).await;
    assert_eq!(stored.size, 7);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/demo/files/a.txt"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[http::header::CONTENT_TYPE], "text/plain");
    assert_eq!(&body_bytes(resp).await[..], b"goodbye");

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(delete("/demo/files/a.txt"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(delete("/demo/files/a.txt"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- full article lifecycle ---

#[tokio::test]
async fn article_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            "/demo/articles",
            r#"{"title":"Rust tips","slug":"rust-tips","content":"Borrow well"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Article = body_json(resp).await;
    let id = created.id;

    // duplicate slug
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            "/demo/articles",
            r#"{"title":"Other","slug":"rust-tips"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            "/demo/articles",
            r#"{"title":"Async basics"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    // search, paging and sort
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/demo/articles?q=rust&page=1&rpp=5&sort=title%7Cdesc&embed="))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let page: Collection<Article> = body_json(resp).await;
    assert_eq!(page.total_records, 1);
    assert_eq!(page.item[0].id, id);
    assert_eq!(page.records_per_page, 5);
    assert_eq!(page.search_query.as_deref(), Some("rust"));
    assert_eq!(page.sort.as_deref(), Some("title|desc"));
    assert_eq!(page.embed.as_deref(), Some(""));

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/demo/articles?page=2&rpp=1"))
        .await
        .unwrap();
    let page: Collection<Article> = body_json(resp).await;
    assert_eq!(page.total_records, 2);
    assert_eq!(page.item.len(), 1);
    assert_eq!(page.item[0].title, "Rust tips");

    // get by slug and by id
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/demo/articles/rust-tips"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched: Article = body_json(resp).await;
    assert_eq!(fetched.id, id);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get(&format!("/demo/articles/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // update: slug collision then partial change
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "PUT",
            &format!("/demo/articles/{id}"),
            r#"{"slug":"async-basics"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "PUT",
            "/demo/articles/rust-tips",
            r#"{"content":"Own less"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Article = body_json(resp).await;
    assert_eq!(updated.title, "Rust tips");
    assert_eq!(updated.content, "Own less");

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(delete("/demo/articles/rust-tips"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get(&format!("/demo/articles/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
