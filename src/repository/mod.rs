//! Repository layer for database operations

pub mod authors;
pub mod books;
pub mod borrows;
pub mod categories;
pub mod members;
pub mod reviews;

use sqlx::{Pool, Postgres};

use crate::error::AppResult;

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub authors: authors::AuthorsRepository,
    pub books: books::BooksRepository,
    pub borrows: borrows::BorrowsRepository,
    pub categories: categories::CategoriesRepository,
    pub members: members::MembersRepository,
    pub reviews: reviews::ReviewsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            authors: authors::AuthorsRepository::new(pool.clone()),
            books: books::BooksRepository::new(pool.clone()),
            borrows: borrows::BorrowsRepository::new(pool.clone()),
            categories: categories::CategoriesRepository::new(pool.clone()),
            members: members::MembersRepository::new(pool.clone()),
            reviews: reviews::ReviewsRepository::new(pool.clone()),
            pool,
        }
    }

    /// Round trip to the database
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
