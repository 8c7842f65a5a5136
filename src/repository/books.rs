//! Books repository: catalog reads and aggregates

use rust_decimal::Decimal;
use sqlx::{PgConnection, Pool, Postgres, QueryBuilder, Row};

use crate::{
    error::{AppError, AppResult},
    models::{
        author::Author,
        book::{BookDetails, BookQuery, BookShort, BookStatus},
        category::Category,
    },
    policy::BookStock,
};

/// Shared catalog projection; must be followed by an optional WHERE clause
/// and `CATALOG_GROUP_BY`.
const CATALOG_SELECT: &str = r#"
    SELECT b.id, b.title, b.author_id, a.name AS author_name,
           b.category_id, c.name AS category_name,
           b.publication_year, b.language, b.total_copies, b.available_copies,
           b.created_at,
           COALESCE(ROUND(AVG(r.stars)::numeric, 1), 0) AS avg_rating,
           COUNT(r.id) AS review_count
    FROM books b
    JOIN authors a ON a.id = b.author_id
    JOIN categories c ON c.id = b.category_id
    LEFT JOIN reviews r ON r.book_id = b.id
"#;

const CATALOG_GROUP_BY: &str = " GROUP BY b.id, a.id, c.id ";

/// Escape LIKE wildcards in user input and wrap it for a contains match
fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &BookQuery) {
        builder.push(" WHERE 1=1");
        if let Some(text) = query.search_text() {
            let pattern = like_pattern(text);
            builder
                .push(" AND (b.title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR a.name ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(category_id) = query.category {
            builder.push(" AND b.category_id = ").push_bind(category_id);
        }
    }

    /// Search the catalog with text, category filter, sort and pagination
    pub async fn search(&self, query: &BookQuery) -> AppResult<(Vec<BookShort>, i64)> {
        let mut count = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM books b JOIN authors a ON a.id = b.author_id",
        );
        Self::push_filters(&mut count, query);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut builder = QueryBuilder::<Postgres>::new(CATALOG_SELECT);
        Self::push_filters(&mut builder, query);
        builder
            .push(CATALOG_GROUP_BY)
            .push(" ORDER BY ")
            .push(query.sort.unwrap_or_default().order_by())
            .push(", b.id DESC LIMIT ")
            .push_bind(query.per_page())
            .push(" OFFSET ")
            .push_bind(query.offset());

        let rows = builder.build().fetch_all(&self.pool).await?;
        Ok((rows.iter().map(BookShort::from_row).collect(), total))
    }

    /// Book page without reviews or viewer status
    pub async fn get_details(&self, id: i32) -> AppResult<BookDetails> {
        let row = sqlx::query(
            r#"
            SELECT b.id, b.title, b.publication_year, b.pages, b.language,
                   b.description, b.total_copies, b.available_copies, b.created_at,
                   a.id AS author_id, a.name AS author_name, a.bio AS author_bio,
                   c.id AS category_id, c.name AS category_name, c.icon AS category_icon,
                   COALESCE((
                       SELECT ROUND(AVG(r.stars)::numeric, 1)
                       FROM reviews r
                       WHERE r.book_id = b.id
                   ), 0) AS avg_rating
            FROM books b
            JOIN authors a ON a.id = b.author_id
            JOIN categories c ON c.id = b.category_id
            WHERE b.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        let available_copies: i32 = row.get("available_copies");
        let avg_rating: Decimal = row.get("avg_rating");

        Ok(BookDetails {
            id: row.get("id"),
            title: row.get("title"),
            author: Author {
                id: row.get("author_id"),
                name: row.get("author_name"),
                bio: row.get("author_bio"),
            },
            category: Category {
                id: row.get("category_id"),
                name: row.get("category_name"),
                icon: row.get("category_icon"),
            },
            publication_year: row.get("publication_year"),
            pages: row.get("pages"),
            language: row.get("language"),
            description: row.get("description"),
            total_copies: row.get("total_copies"),
            available_copies,
            status: BookStatus::from_available_copies(available_copies),
            avg_rating,
            created_at: row.get("created_at"),
            reviews: Vec::new(),
            viewer: None,
        })
    }

    /// Most recently added books
    pub async fn latest(&self, limit: i64) -> AppResult<Vec<BookShort>> {
        let query = format!(
            "{} {} ORDER BY b.created_at DESC, b.id DESC LIMIT $1",
            CATALOG_SELECT, CATALOG_GROUP_BY
        );
        let rows = sqlx::query(&query).bind(limit).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(BookShort::from_row).collect())
    }

    /// Books with the most reviews, newest first on ties
    pub async fn most_reviewed(&self, limit: i64) -> AppResult<Vec<BookShort>> {
        let query = format!(
            "{} {} ORDER BY COUNT(r.id) DESC, b.created_at DESC, b.id DESC LIMIT $1",
            CATALOG_SELECT, CATALOG_GROUP_BY
        );
        let rows = sqlx::query(&query).bind(limit).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(BookShort::from_row).collect())
    }

    /// Books of a category, newest first
    pub async fn list_by_category(&self, category_id: i32) -> AppResult<Vec<BookShort>> {
        let query = format!(
            "{} WHERE b.category_id = $1 {} ORDER BY b.created_at DESC, b.id DESC",
            CATALOG_SELECT, CATALOG_GROUP_BY
        );
        let rows = sqlx::query(&query)
            .bind(category_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(BookShort::from_row).collect())
    }

    /// Books of an author, newest first
    pub async fn list_by_author(&self, author_id: i32) -> AppResult<Vec<BookShort>> {
        let query = format!(
            "{} WHERE b.author_id = $1 {} ORDER BY b.created_at DESC, b.id DESC",
            CATALOG_SELECT, CATALOG_GROUP_BY
        );
        let rows = sqlx::query(&query)
            .bind(author_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(BookShort::from_row).collect())
    }

    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // =========================================================================
    // STOCK (inside lending transactions)
    // =========================================================================

    /// Read the copy counters of a book and hold its row lock until the
    /// enclosing transaction ends.
    pub async fn lock_stock(conn: &mut PgConnection, book_id: i32) -> AppResult<BookStock> {
        let (total_copies, available_copies): (i32, i32) = sqlx::query_as(
            "SELECT total_copies, available_copies FROM books WHERE id = $1 FOR UPDATE",
        )
        .bind(book_id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", book_id)))?;

        Ok(BookStock::new(total_copies, available_copies))
    }

    /// Write back counters previously read with `lock_stock`
    pub async fn write_stock(conn: &mut PgConnection, book_id: i32, stock: BookStock) -> AppResult<()> {
        sqlx::query("UPDATE books SET available_copies = $1 WHERE id = $2")
            .bind(stock.available_copies)
            .bind(book_id)
            .execute(conn)
            .await?;
        Ok(())
    }
}
