use std::{collections::HashMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// Application segment every route is nested under.
pub const APPLICATION_ID: &str = "demo";

/// Multipart field carrying an uploaded file.
pub const FILE_FIELD: &str = "file";

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Deserialize)]
pub struct NewArticle {
    pub title: String,
    pub slug: Option<String>,
    #[serde(default)]
    pub content: String,
}

#[derive(Deserialize)]
pub struct ArticleUpdate {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection<T> {
    pub item: Vec<T>,
    pub page: u32,
    pub records_per_page: u32,
    pub total_records: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embed: Option<String>,
}

#[derive(Deserialize)]
pub struct FindQuery {
    pub q: Option<String>,
    pub page: Option<u32>,
    pub rpp: Option<u32>,
    pub sort: Option<String>,
    pub embed: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub name: String,
    pub content_type: String,
    pub size: usize,
}

#[derive(Default)]
pub struct Store {
    articles: HashMap<Uuid, Article>,
    files: HashMap<String, (StoredFile, Bytes)>,
}

impl Store {
    /// Look an article up by id or, failing that, by slug.
    fn article_id(&self, key: &str) -> Option<Uuid> {
        if let Ok(id) = key.parse::<Uuid>() {
            if self.articles.contains_key(&id) {
                return Some(id);
            }
        }
        self.articles
            .values()
            .find(|article| article.slug == key)
            .map(|article| article.id)
    }

    fn slug_taken(&self, slug: &str, except: Option<Uuid>) -> bool {
        self.articles
            .values()
            .any(|article| article.slug == slug && Some(article.id) != except)
    }
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    let db: Db = Arc::default();
    let api = Router::new()
        .route("/articles", get(find_articles).post(create_article))
        .route(
            "/articles/{key}",
            get(get_article).put(update_article).delete(delete_article),
        )
        .route(
            "/files/{name}",
            get(download_file)
                .post(create_file)
                .put(replace_file)
                .delete(delete_file),
        )
        .route("/status/{code}", get(echo_status))
        .route("/headers", get(echo_headers))
        .with_state(db);
    Router::new().nest(&format!("/{APPLICATION_ID}"), api)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Lowercase `title`, collapsing every run of non-alphanumerics into `-`.
pub fn slugify(title: &str) -> String {
    title
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

async fn find_articles(
    State(db): State<Db>,
    Query(query): Query<FindQuery>,
) -> Json<Collection<Article>> {
    let store = db.read().await;
    let needle = query.q.as_deref().map(str::to_lowercase);
    let mut matches: Vec<Article> = store
        .articles
        .values()
        .filter(|article| {
            needle
                .as_deref()
                .is_none_or(|needle| article.title.to_lowercase().contains(needle))
        })
        .cloned()
        .collect();
    match query.sort.as_deref() {
        Some("title|desc") => matches.sort_by(|a, b| b.title.cmp(&a.title)),
        _ => matches.sort_by(|a, b| a.title.cmp(&b.title)),
    }

    let page = query.page.unwrap_or(1).max(1);
    let rpp = query.rpp.unwrap_or(10);
    let total_records = matches.len() as u64;
    let item = matches
        .into_iter()
        .skip(page_offset(page, rpp))
        .take(rpp as usize)
        .collect();
    Json(Collection {
        item,
        page,
        records_per_page: rpp,
        total_records,
        search_query: query.q,
        sort: query.sort,
        embed: query.embed,
    })
}

/// Records skipped before `page` (1-based); saturates instead of overflowing.
fn page_offset(page: u32, rpp: u32) -> usize {
    (page.saturating_sub(1) as usize).saturating_mul(rpp as usize)
}

async fn create_article(
    State(db): State<Db>,
    Json(input): Json<NewArticle>,
) -> Result<(StatusCode, Json<Article>), StatusCode> {
    let mut store = db.write().await;
    let slug = input.slug.unwrap_or_else(|| slugify(&input.title));
    if store.slug_taken(&slug, None) {
        return Err(StatusCode::CONFLICT);
    }
    let article = Article {
        id: Uuid::new_v4(),
        slug,
        title: input.title,
        content: input.content,
    };
    tracing::debug!(id = %article.id, slug = %article.slug, "article created");
    store.articles.insert(article.id, article.clone());
    Ok((StatusCode::CREATED, Json(article)))
}

async fn get_article(
    State(db): State<Db>,
    Path(key): Path<String>,
) -> Result<Json<Article>, StatusCode> {
    let store = db.read().await;
    store
        .article_id(&key)
        .and_then(|id| store.articles.get(&id))
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn update_article(
    State(db): State<Db>,
    Path(key): Path<String>,
    Json(input): Json<ArticleUpdate>,
) -> Result<Json<Article>, StatusCode> {
    let mut store = db.write().await;
    let id = store.article_id(&key).ok_or(StatusCode::NOT_FOUND)?;
    if let Some(slug) = &input.slug {
        if store.slug_taken(slug, Some(id)) {
            return Err(StatusCode::CONFLICT);
        }
    }
    let article = store.articles.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    if let Some(title) = input.title {
        article.title = title;
    }
    if let Some(slug) = input.slug {
        article.slug = slug;
    }
    if let Some(content) = input.content {
        article.content = content;
    }
    Ok(Json(article.clone()))
}

async fn delete_article(
    State(db): State<Db>,
    Path(key): Path<String>,
) -> Result<StatusCode, StatusCode> {
    let mut store = db.write().await;
    let id = store.article_id(&key).ok_or(StatusCode::NOT_FOUND)?;
    store.articles.remove(&id);
    Ok(StatusCode::NO_CONTENT)
}

async fn read_upload(mut multipart: Multipart) -> Result<(String, Bytes), StatusCode> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?
    {
        if field.name() == Some(FILE_FIELD) {
            let content_type = field
                .content_type()
                .unwrap_or(DEFAULT_CONTENT_TYPE)
                .to_string();
            let data = field.bytes().await.map_err(|_| StatusCode::BAD_REQUEST)?;
            return Ok((content_type, data));
        }
    }
    Err(StatusCode::BAD_REQUEST)
}

async fn download_file(
    State(db): State<Db>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    let store = db.read().await;
    let (meta, data) = store.files.get(&name).ok_or(StatusCode::NOT_FOUND)?;
    Ok(([(header::CONTENT_TYPE, meta.content_type.clone())], data.clone()))
}

async fn create_file(
    State(db): State<Db>,
    Path(name): Path<String>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<StoredFile>), StatusCode> {
    let (content_type, data) = read_upload(multipart).await?;
    let mut store = db.write().await;
    if store.files.contains_key(&name) {
        return Err(StatusCode::CONFLICT);
    }
    let meta = StoredFile {
        name: name.clone(),
        content_type,
        size: data.len(),
    };
    store.files.insert(name, (meta.clone(), data));
    Ok((StatusCode::CREATED, Json(meta)))
}

async fn replace_file(
    State(db): State<Db>,
    Path(name): Path<String>,
    multipart: Multipart,
) -> Result<Json<StoredFile>, StatusCode> {
    let (content_type, data) = read_upload(multipart).await?;
    let mut store = db.write().await;
    let entry = store.files.get_mut(&name).ok_or(StatusCode::NOT_FOUND)?;
    entry.0.content_type = content_type;
    entry.0.size = data.len();
    entry.1 = data;
    Ok(Json(entry.0.clone()))
}

async fn delete_file(
    State(db): State<Db>,
    Path(name): Path<String>,
) -> Result<StatusCode, StatusCode> {
    let mut store = db.write().await;
    store
        .files
        .remove(&name)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn echo_status(Path(code): Path<u16>) -> (StatusCode, String) {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST);
    (status, format!("status {code}"))
}

/// Request headers as a JSON object keyed by lowercase name.
async fn echo_headers(headers: HeaderMap) -> Json<HashMap<String, String>> {
    let echoed = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();
    Json(echoed)
}
