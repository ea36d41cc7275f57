// Catalog endpoints: books, authors, categories, subcategories.
//
// Every list call goes through `list_of`, the one place where the server's
// three list shapes are collapsed into `ListResult<T>`.

use std::collections::BTreeMap;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::client::AdminClient;
use crate::error::Error;
use crate::list::{ListEnvelope, ListParams, ListResult};
use crate::models::{
    Author, AuthorPayload, Book, BookPayload, Category, CategoryPayload, Subcategory,
    SubcategoryPayload,
};

pub(crate) const BOOKS: &str = "/api/admin/books";
pub(crate) const AUTHORS: &str = "/api/admin/authors";
pub(crate) const CATEGORIES: &str = "/api/admin/categories";
pub(crate) const SUBCATEGORIES: &str = "/api/admin/subcategories";

fn item_path(collection: &str, id: u64) -> String {
    format!("{collection}/{id}")
}

impl AdminClient {
    /// GET a list endpoint and normalize whichever shape it answers with.
    pub(crate) async fn list_of<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &ListParams,
    ) -> Result<ListResult<T>, Error> {
        let envelope: ListEnvelope<T> = self.get(path, &params.to_pairs()).await?;
        let result = ListResult::from(envelope);
        debug!(path, count = result.len(), total = ?result.total, "list fetched");
        Ok(result)
    }

    async fn create_at(&self, path: &str, payload: &(impl Serialize + Sync)) -> Result<Value, Error> {
        self.post(path, payload).await
    }

    async fn update_at(
        &self,
        collection: &str,
        id: u64,
        payload: &(impl Serialize + Sync),
    ) -> Result<Value, Error> {
        self.put(&item_path(collection, id), payload).await
    }

    async fn delete_at(&self, collection: &str, id: u64) -> Result<Value, Error> {
        self.delete(&item_path(collection, id), &BTreeMap::<String, String>::new())
            .await
    }

    // ── Books ────────────────────────────────────────────────────────

    pub async fn list_books(&self, params: &ListParams) -> Result<ListResult<Book>, Error> {
        self.list_of(BOOKS, params).await
    }

    /// Full book record, including its author associations and
    /// specification rows.
    pub async fn get_book(&self, id: u64) -> Result<Book, Error> {
        self.get(&item_path(BOOKS, id), &BTreeMap::<String, String>::new())
            .await
    }

    pub async fn create_book(&self, payload: &BookPayload) -> Result<Value, Error> {
        self.create_at(BOOKS, payload).await
    }

    pub async fn update_book(&self, id: u64, payload: &BookPayload) -> Result<Value, Error> {
        self.update_at(BOOKS, id, payload).await
    }

    /// Delete a book. With `delete_file` the server also removes the stored
    /// book file (`?delete_file=1`).
    pub async fn delete_book(&self, id: u64, delete_file: bool) -> Result<Value, Error> {
        let mut params = BTreeMap::new();
        if delete_file {
            params.insert("delete_file", "1");
        }
        self.delete(&item_path(BOOKS, id), &params).await
    }

    // ── Authors ──────────────────────────────────────────────────────

    pub async fn list_authors(&self, params: &ListParams) -> Result<ListResult<Author>, Error> {
        self.list_of(AUTHORS, params).await
    }

    pub async fn get_author(&self, id: u64) -> Result<Author, Error> {
        self.get(&item_path(AUTHORS, id), &BTreeMap::<String, String>::new())
            .await
    }

    pub async fn create_author(&self, payload: &AuthorPayload) -> Result<Value, Error> {
        self.create_at(AUTHORS, payload).await
    }

    pub async fn update_author(&self, id: u64, payload: &AuthorPayload) -> Result<Value, Error> {
        self.update_at(AUTHORS, id, payload).await
    }

    pub async fn delete_author(&self, id: u64) -> Result<Value, Error> {
        self.delete_at(AUTHORS, id).await
    }

    // ── Categories ───────────────────────────────────────────────────

    pub async fn list_categories(
        &self,
        params: &ListParams,
    ) -> Result<ListResult<Category>, Error> {
        self.list_of(CATEGORIES, params).await
    }

    pub async fn get_category(&self, id: u64) -> Result<Category, Error> {
        self.get(&item_path(CATEGORIES, id), &BTreeMap::<String, String>::new())
            .await
    }

    pub async fn create_category(&self, payload: &CategoryPayload) -> Result<Value, Error> {
        self.create_at(CATEGORIES, payload).await
    }

    pub async fn update_category(
        &self,
        id: u64,
        payload: &CategoryPayload,
    ) -> Result<Value, Error> {
        self.update_at(CATEGORIES, id, payload).await
    }

    pub async fn delete_category(&self, id: u64) -> Result<Value, Error> {
        self.delete_at(CATEGORIES, id).await
    }

    // ── Subcategories ────────────────────────────────────────────────

    pub async fn list_subcategories(
        &self,
        params: &ListParams,
    ) -> Result<ListResult<Subcategory>, Error> {
        self.list_of(SUBCATEGORIES, params).await
    }

    pub async fn get_subcategory(&self, id: u64) -> Result<Subcategory, Error> {
        self.get(&item_path(SUBCATEGORIES, id), &BTreeMap::<String, String>::new())
            .await
    }

    pub async fn create_subcategory(&self, payload: &SubcategoryPayload) -> Result<Value, Error> {
        self.create_at(SUBCATEGORIES, payload).await
    }

    pub async fn update_subcategory(
        &self,
        id: u64,
        payload: &SubcategoryPayload,
    ) -> Result<Value, Error> {
        self.update_at(SUBCATEGORIES, id, payload).await
    }

    pub async fn delete_subcategory(&self, id: u64) -> Result<Value, Error> {
        self.delete_at(SUBCATEGORIES, id).await
    }
}
