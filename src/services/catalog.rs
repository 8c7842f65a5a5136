//! Catalog query service (read side)

use crate::{
    error::AppResult,
    models::{
        author::{AuthorDetails, AuthorWithCount},
        book::{BookDetails, BookQuery, BookShort, ViewerStatus},
        category::{CategoryBooks, CategoryWithCount},
        user::Member,
    },
    repository::Repository,
};

const LATEST_BOOKS: i64 = 6;
const TOP_RATED_BOOKS: i64 = 3;

/// Home page content
#[derive(Debug, Clone)]
pub struct HomeOverview {
    pub latest_books: Vec<BookShort>,
    pub top_rated: Vec<BookShort>,
    pub books: i64,
    pub authors: i64,
    pub readers: i64,
}

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Search books with filters
    pub async fn search_books(&self, query: &BookQuery) -> AppResult<(Vec<BookShort>, i64)> {
        self.repository.books.search(query).await
    }

    /// Get a book page. Members also get their borrowing state for the book.
    pub async fn get_book(&self, id: i32, viewer: Option<&Member>) -> AppResult<BookDetails> {
        let mut book = self.repository.books.get_details(id).await?;
        book.reviews = self.repository.reviews.list_for_book(id).await?;

        if let Some(member) = viewer.filter(|m| !m.is_staff) {
            let (current, before) = self
                .repository
                .borrows
                .member_book_state(member.id, id)
                .await?;
            book.viewer = Some(ViewerStatus::new(book.available_copies > 0, current, before));
        }

        Ok(book)
    }

    pub async fn list_categories(&self) -> AppResult<Vec<CategoryWithCount>> {
        self.repository.categories.list_with_counts().await
    }

    pub async fn category_books(&self, id: i32) -> AppResult<CategoryBooks> {
        let category = self.repository.categories.get_by_id(id).await?;
        let books = self.repository.books.list_by_category(id).await?;
        Ok(CategoryBooks { category, books })
    }

    pub async fn list_authors(&self) -> AppResult<Vec<AuthorWithCount>> {
        self.repository.authors.list_with_counts().await
    }

    pub async fn author_details(&self, id: i32) -> AppResult<AuthorDetails> {
        let author = self.repository.authors.get_by_id(id).await?;
        let books = self.repository.books.list_by_author(id).await?;
        Ok(AuthorDetails { author, books })
    }

    /// Latest additions, most reviewed books and headline counts
    pub async fn home(&self) -> AppResult<HomeOverview> {
        Ok(HomeOverview {
            latest_books: self.repository.books.latest(LATEST_BOOKS).await?,
            top_rated: self.repository.books.most_reviewed(TOP_RATED_BOOKS).await?,
            books: self.repository.books.count().await?,
            authors: self.repository.authors.count().await?,
            readers: self.repository.members.count_readers().await?,
        })
    }

    /// Database readiness
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.ping().await
    }
}
