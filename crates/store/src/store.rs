//! The five-document store.

use std::fs;
use std::path::{Path, PathBuf};

use kudos_core::order::Order;
use kudos_core::product::Product;
use kudos_core::submission::Submission;
use kudos_core::task::Task;
use kudos_core::user::User;

use crate::collection::Collection;
use crate::error::StoreError;

const USERS_FILE: &str = "users_data.json";
const TASKS_FILE: &str = "tasks_data.json";
const SUBMISSIONS_FILE: &str = "submissions_data.json";
const PRODUCTS_FILE: &str = "products_data.json";
const ORDERS_FILE: &str = "orders_data.json";

/// Record counts destroyed by a full reset, for the audit log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetCounts {
    pub users: usize,
    pub tasks: usize,
    pub submissions: usize,
    pub products: usize,
    pub orders: usize,
}

impl ResetCounts {
    pub fn total(&self) -> usize {
        self.users + self.tasks + self.submissions + self.products + self.orders
    }
}

/// Owns the five entity collections, one JSON document each.
///
/// Collections are independent: an operation spanning two of them (for
/// example the purchase commit) is atomic per collection but not across
/// them. Shared via `Arc<JsonStore>`.
#[derive(Debug)]
pub struct JsonStore {
    data_dir: PathBuf,
    users: Collection<User>,
    tasks: Collection<Task>,
    submissions: Collection<Submission>,
    products: Collection<Product>,
    orders: Collection<Order>,
}

impl JsonStore {
    /// Open (or initialize) the store under `data_dir`.
    ///
    /// The directory is created if missing. Missing documents start empty;
    /// unreadable ones fail the open.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let data_dir = data_dir.as_ref().to_path_buf();
        fs::create_dir_all(&data_dir).map_err(|source| StoreError::Write {
            path: data_dir.clone(),
            source,
        })?;

        Ok(Self {
            users: Collection::open(data_dir.join(USERS_FILE))?,
            tasks: Collection::open(data_dir.join(TASKS_FILE))?,
            submissions: Collection::open(data_dir.join(SUBMISSIONS_FILE))?,
            products: Collection::open(data_dir.join(PRODUCTS_FILE))?,
            orders: Collection::open(data_dir.join(ORDERS_FILE))?,
            data_dir,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn users(&self) -> &Collection<User> {
        &self.users
    }

    pub fn tasks(&self) -> &Collection<Task> {
        &self.tasks
    }

    pub fn submissions(&self) -> &Collection<Submission> {
        &self.submissions
    }

    pub fn products(&self) -> &Collection<Product> {
        &self.products
    }

    pub fn orders(&self) -> &Collection<Order> {
        &self.orders
    }

    /// Empty every collection, persisting five empty documents.
    ///
    /// Stops at the first collection that fails to persist; collections
    /// already cleared stay cleared.
    pub async fn reset_all(&self) -> Result<ResetCounts, StoreError> {
        Ok(ResetCounts {
            users: self.users.clear().await?,
            tasks: self.tasks.clear().await?,
            submissions: self.submissions.clear().await?,
            products: self.products.clear().await?,
            orders: self.orders.clear().await?,
        })
    }
}
