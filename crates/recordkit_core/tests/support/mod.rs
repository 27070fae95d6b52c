#![allow(dead_code)]

use recordkit_core::{Context, Domain, Entity, Model, RawFields, Store};
use serde_json::json;

pub struct Article;

impl Entity for Article {
    const KIND: &'static str = "Article";
}

/// Sub-entity of `Article`.
pub struct Feature;

impl Entity for Feature {
    const KIND: &'static str = "Feature";
}

pub struct Tag;

impl Entity for Tag {
    const KIND: &'static str = "Tag";
}

pub fn model() -> Model {
    Model::builder()
        .entity("Article")
        .subentity("Feature", "Article")
        .entity("Tag")
        .build()
        .unwrap()
}

pub fn open_store() -> Store {
    Store::open_in_memory(model()).unwrap()
}

pub fn main_context() -> (Store, Context) {
    let store = open_store();
    let context = store.new_context(Domain::Main);
    (store, context)
}

/// Six articles with ids 1..=6; exactly two titles contain "art".
pub fn article_list_json() -> serde_json::Value {
    json!([
        {"id": 1, "title": "Art of Rust", "author": "Ana"},
        {"id": 2, "title": "Sailing basics", "author": "Ben"},
        {"id": 3, "title": "Modern art review", "author": "Ana"},
        {"id": 4, "title": "Kitchen notes", "author": "Cleo"},
        {"id": 5, "title": "Weekly digest", "author": "Dev"},
        {"id": 6, "title": "Garden log", "author": "Ben"}
    ])
}

pub fn article_list() -> Vec<RawFields> {
    article_list_json()
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item.as_object().unwrap().clone())
        .collect()
}
