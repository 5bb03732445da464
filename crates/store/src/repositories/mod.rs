//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&JsonStore` as the first argument. Domain checks that must be
//! atomic (balance covers price, stock below cap, one-shot review) run
//! inside the owning collection's write lock.

pub mod order_repo;
pub mod product_repo;
pub mod submission_repo;
pub mod task_repo;
pub mod user_repo;

pub use order_repo::OrderRepo;
pub use product_repo::ProductRepo;
pub use submission_repo::SubmissionRepo;
pub use task_repo::{TaskDeletion, TaskRepo};
pub use user_repo::{RegisterOutcome, UserRepo};
