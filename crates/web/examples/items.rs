//! An in-memory item store served through the endpoint interpreter.
//!
//! Requests are fed to the interpreter directly, each response is logged.

use bytes::Bytes;
use http::{Method, Request, StatusCode};
use http_body_util::{BodyExt, Full};
use micro_endpoint::io::{
    delete, get, header, json_body, path, path_param, post, query_list, query_opt, status, status_code, string_body,
};
use micro_endpoint::{Endpoint, ValidationError};
use micro_endpoint_web::{server_endpoint, ServerInterpreter, ServerOptions};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Item {
    id: u32,
    name: String,
    tags: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
struct Limit(usize);

type Store = Arc<Mutex<BTreeMap<u32, Item>>>;

fn not_found(id: u32) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, format!("no item {id}"))
}

fn interpreter(store: &Store) -> ServerInterpreter {
    let limit = query_opt::<usize>("limit").try_map(
        |(limit,)| match limit {
            Some(limit) if limit > 100 => Err(ValidationError::new("limit must be at most 100", limit)),
            limit => Ok(Limit(limit.unwrap_or(10))),
        },
        |Limit(limit)| (Some(limit),),
    );

    let list_items = Endpoint::builder()
        .name("list-items")
        .input(get().and(path("items")).and(query_list::<String>("tag")).and(limit))
        .output(json_body::<Vec<Item>>())
        .build()
        .expect("list-items declaration");

    let get_item = Endpoint::builder()
        .name("get-item")
        .input(get().and(path("items")).and(path_param::<u32>("id")))
        .error_output(status_code().and(string_body()))
        .output(json_body::<Item>())
        .build()
        .expect("get-item declaration");

    let create_item = Endpoint::builder()
        .name("create-item")
        .input(post().and(path("items")).and(json_body::<Item>()))
        .error_output(status(StatusCode::CONFLICT).and(string_body()))
        .output(status(StatusCode::CREATED).and(json_body::<Item>()))
        .build()
        .expect("create-item declaration");

    let delete_item = Endpoint::builder()
        .name("delete-item")
        .input(delete().and(path("items")).and(path_param::<u32>("id")).and(header::<String>("authorization")))
        .error_output(status_code().and(string_body()))
        .output(status(StatusCode::NO_CONTENT))
        .build()
        .expect("delete-item declaration");

    let list_store = Arc::clone(store);
    let get_store = Arc::clone(store);
    let create_store = Arc::clone(store);
    let delete_store = Arc::clone(store);

    ServerInterpreter::builder()
        .options(ServerOptions::builder().default_error_status(StatusCode::UNPROCESSABLE_ENTITY).build())
        .endpoint(server_endpoint(list_items, move |(tags, Limit(limit)): (Vec<String>, Limit)| {
            let store = Arc::clone(&list_store);
            async move {
                let items = store.lock().await;
                let found: Vec<Item> = items
                    .values()
                    .filter(|item| tags.iter().all(|tag| item.tags.contains(tag)))
                    .take(limit)
                    .cloned()
                    .collect();
                Ok::<_, ()>((found,))
            }
        }))
        .endpoint(server_endpoint(get_item, move |(id,): (u32,)| {
            let store = Arc::clone(&get_store);
            async move { store.lock().await.get(&id).cloned().map(|item| (item,)).ok_or_else(|| not_found(id)) }
        }))
        .endpoint(server_endpoint(create_item, move |(item,): (Item,)| {
            let store = Arc::clone(&create_store);
            async move {
                let mut items = store.lock().await;
                if items.contains_key(&item.id) {
                    return Err((format!("item {} exists", item.id),));
                }
                items.insert(item.id, item.clone());
                Ok((item,))
            }
        }))
        .endpoint(server_endpoint(delete_item, move |(id, token): (u32, String)| {
            let store = Arc::clone(&delete_store);
            async move {
                if token != "Bearer secret" {
                    return Err((StatusCode::FORBIDDEN, "bad token".to_string()));
                }
                store.lock().await.remove(&id).map(|_| ()).ok_or_else(|| not_found(id))
            }
        }))
        .build()
}

fn request(method: Method, uri: &str, headers: &[(&str, &str)], body: &'static str) -> Request<Full<Bytes>> {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(Full::new(Bytes::from_static(body.as_bytes()))).expect("valid request")
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let store: Store = Arc::default();
    let interpreter = interpreter(&store);

    let requests = vec![
        request(Method::POST, "/items", &[], r#"{"id":1,"name":"pen","tags":["office"]}"#),
        request(Method::POST, "/items", &[], r#"{"id":2,"name":"mug","tags":["kitchen","office"]}"#),
        request(Method::POST, "/items", &[], r#"{"id":2,"name":"cup","tags":[]}"#),
        request(Method::POST, "/items", &[], r#"{"id":"three"}"#),
        request(Method::GET, "/items?tag=office&limit=5", &[], ""),
        request(Method::GET, "/items?limit=500", &[], ""),
        request(Method::GET, "/items/2", &[], ""),
        request(Method::GET, "/items/9", &[], ""),
        request(Method::DELETE, "/items/1", &[], ""),
        request(Method::DELETE, "/items/1", &[("authorization", "Bearer secret")], ""),
        request(Method::GET, "/users", &[], ""),
    ];

    for request in requests {
        let (method, uri) = (request.method().clone(), request.uri().clone());
        let response = interpreter.handle(request).await;
        let status = response.status();
        let body = match response.into_body().collect().await {
            Ok(collected) => String::from_utf8_lossy(&collected.to_bytes()).into_owned(),
            Err(e) => format!("<body error: {e}>"),
        };
        info!(%method, %uri, %status, %body, "response");
    }
}
