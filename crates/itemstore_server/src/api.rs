//! REST resource handler for items.
//!
//! # Responsibility
//! - Route `/{resource}` and `/{resource}/{id}` to item service calls.
//! - Decode JSON payloads and map service results to status codes.
//!
//! # Invariants
//! - The handler holds no item state between requests.
//! - Update and delete use one response style for the whole deployment.
//! - Storage failures never leak their details into response bodies.

use crate::http::{HttpMethod, HttpRequest, HttpResponse, HttpService, HttpStatus};
use itemstore_core::{Item, ItemDraft, ItemId, ItemRepository, ItemService, RepoError};
use log::error;
use serde::Deserialize;
use serde_json::Value;

const COLLECTION_METHODS: &str = "GET, POST";
const MEMBER_METHODS: &str = "GET, PUT, PATCH, DELETE";

/// Success response for update and delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationResponse {
    /// 200 with the updated or deleted item.
    #[default]
    Record,
    /// 204 with an empty body.
    NoContent,
}

/// Per-deployment handler settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiSettings {
    /// Path segment the entity is served under, e.g. `items`.
    pub resource: String,
    pub mutation_response: MutationResponse,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            resource: "items".to_string(),
            mutation_response: MutationResponse::default(),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Route<'a> {
    Collection,
    Member(ItemId),
    InvalidId(&'a str),
    Unknown,
}

/// Maps HTTP requests for one entity type onto an `ItemService`.
pub struct ItemApi<R: ItemRepository> {
    service: ItemService<R>,
    settings: ApiSettings,
}

impl<R: ItemRepository> ItemApi<R> {
    pub fn new(service: ItemService<R>, settings: ApiSettings) -> Self {
        Self { service, settings }
    }

    /// Handles one request. Never panics on client input.
    pub fn handle(&self, request: &HttpRequest) -> HttpResponse {
        match (self.route(request.path()), request.method()) {
            (Route::Collection, HttpMethod::Get) => self.list(),
            (Route::Collection, HttpMethod::Post) => self.create(request.body()),
            (Route::Collection, _) => method_not_allowed(COLLECTION_METHODS),
            (Route::Member(id), HttpMethod::Get) => self.get(id),
            (Route::Member(id), HttpMethod::Put | HttpMethod::Patch) => {
                self.update(id, request.body())
            }
            (Route::Member(id), HttpMethod::Delete) => self.delete(id),
            (Route::Member(_), _) => method_not_allowed(MEMBER_METHODS),
            (Route::InvalidId(raw), _) => HttpResponse::error(
                HttpStatus::BadRequest,
                &format!("invalid {} id `{raw}`", self.settings.resource),
            ),
            (Route::Unknown, _) => HttpResponse::error(
                HttpStatus::NotFound,
                &format!("no route for `{}`", request.path()),
            ),
        }
    }

    fn route<'a>(&self, path: &'a str) -> Route<'a> {
        let Some(rest) = path.trim_end_matches('/').strip_prefix('/') else {
            return Route::Unknown;
        };

        let mut segments = rest.split('/');
        match (segments.next(), segments.next(), segments.next()) {
            (Some(resource), None, None) if resource == self.settings.resource => {
                Route::Collection
            }
            (Some(resource), Some(raw_id), None) if resource == self.settings.resource => {
                match raw_id.parse::<ItemId>() {
                    Ok(id) => Route::Member(id),
                    Err(_) => Route::InvalidId(raw_id),
                }
            }
            _ => Route::Unknown,
        }
    }

    fn list(&self) -> HttpResponse {
        match self.service.list_items() {
            Ok(items) => HttpResponse::json(HttpStatus::Ok, &items),
            Err(err) => repo_error_response(&err),
        }
    }

    fn get(&self, id: ItemId) -> HttpResponse {
        match self.service.get_item(id) {
            Ok(item) => HttpResponse::json(HttpStatus::Ok, &item),
            Err(err) => repo_error_response(&err),
        }
    }

    fn create(&self, body: &[u8]) -> HttpResponse {
        let name = match decode_name(body) {
            Ok(name) => name,
            Err(response) => return response,
        };

        match self.service.create_item(&name) {
            Ok(item) => HttpResponse::json(HttpStatus::Created, &item).with_header(
                "Location",
                format!("/{}/{}", self.settings.resource, item.id),
            ),
            Err(err) => repo_error_response(&err),
        }
    }

    fn update(&self, id: ItemId, body: &[u8]) -> HttpResponse {
        let name = match decode_name(body) {
            Ok(name) => name,
            Err(response) => return response,
        };

        match self.service.update_item(id, &name) {
            Ok(item) => self.mutation_response(&item),
            Err(err) => repo_error_response(&err),
        }
    }

    fn delete(&self, id: ItemId) -> HttpResponse {
        match self.service.delete_item(id) {
            Ok(item) => self.mutation_response(&item),
            Err(err) => repo_error_response(&err),
        }
    }

    fn mutation_response(&self, item: &Item) -> HttpResponse {
        match self.settings.mutation_response {
            MutationResponse::Record => HttpResponse::json(HttpStatus::Ok, item),
            MutationResponse::NoContent => HttpResponse::no_content(),
        }
    }
}

impl<R: ItemRepository + 'static> HttpService for ItemApi<R> {
    fn handle_request(&self, request: HttpRequest) -> HttpResponse {
        self.handle(&request)
    }
}

fn decode_name(body: &[u8]) -> Result<String, HttpResponse> {
    let value: Value = serde_json::from_slice(body).map_err(|err| {
        HttpResponse::error(HttpStatus::BadRequest, &format!("malformed JSON body: {err}"))
    })?;
    if !value.is_object() {
        return Err(HttpResponse::error(
            HttpStatus::BadRequest,
            "request body must be a JSON object",
        ));
    }

    let draft: ItemDraft = serde_json::from_value(value).map_err(|err| {
        HttpResponse::error(HttpStatus::BadRequest, &format!("invalid item payload: {err}"))
    })?;

    draft
        .require_name()
        .map_err(|err| HttpResponse::error(HttpStatus::BadRequest, &err.to_string()))
}

fn method_not_allowed(allowed: &str) -> HttpResponse {
    HttpResponse::error(HttpStatus::MethodNotAllowed, "method not allowed")
        .with_header("Allow", allowed)
}

fn repo_error_response(err: &RepoError) -> HttpResponse {
    match err {
        RepoError::Validation(err) => HttpResponse::error(HttpStatus::BadRequest, &err.to_string()),
        RepoError::NotFound(_) => HttpResponse::error(HttpStatus::NotFound, &err.to_string()),
        _ => {
            error!("event=api_store_failure module=api status=error error={err}");
            HttpResponse::error(HttpStatus::InternalServerError, "internal storage error")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ApiSettings, ItemApi, Route};
    use itemstore_core::{InMemoryItemRepository, ItemService};

    fn api(resource: &str) -> ItemApi<InMemoryItemRepository> {
        ItemApi::new(
            ItemService::new(InMemoryItemRepository::new()),
            ApiSettings {
                resource: resource.to_string(),
                ..ApiSettings::default()
            },
        )
    }

    #[test]
    fn route_accepts_trailing_slash() {
        let api = api("items");
        assert_eq!(api.route("/items"), Route::Collection);
        assert_eq!(api.route("/items/"), Route::Collection);
        assert_eq!(api.route("/items/12/"), Route::Member(12));
    }

    #[test]
    fn route_rejects_other_resources_and_deep_paths() {
        let api = api("books");
        assert_eq!(api.route("/items"), Route::Unknown);
        assert_eq!(api.route("/books/1/cover"), Route::Unknown);
        assert_eq!(api.route("/"), Route::Unknown);
        assert_eq!(api.route(""), Route::Unknown);
    }

    #[test]
    fn route_flags_non_numeric_ids() {
        let api = api("items");
        assert_eq!(api.route("/items/abc"), Route::InvalidId("abc"));
    }
}
