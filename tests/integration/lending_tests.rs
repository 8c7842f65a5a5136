//! Lending rules against a real Postgres database

use athenaeum_server::{
    models::{review::CreateReview, user::Member},
    policy::{LendingError, LendingRules},
    repository::Repository,
    services::{lending::LendingService, Services},
    AppError,
};
use sqlx::PgPool;

fn member(id: i32) -> Member {
    Member {
        id,
        username: format!("reader{}", id),
        is_staff: false,
    }
}

fn staff(id: i32) -> Member {
    Member {
        id,
        username: format!("staff{}", id),
        is_staff: true,
    }
}

fn services(pool: &PgPool) -> Services {
    Services::new(Repository::new(pool.clone()), LendingRules::default())
}

/// Insert one author, one category and a book with `copies` copies
async fn seed_book(pool: &PgPool, title: &str, copies: i32) -> i32 {
    let author_id: i32 = sqlx::query_scalar("INSERT INTO authors (name) VALUES ($1) RETURNING id")
        .bind(format!("Author of {}", title))
        .fetch_one(pool)
        .await
        .expect("insert author");
    let category_id: i32 =
        sqlx::query_scalar("INSERT INTO categories (name) VALUES ($1) RETURNING id")
            .bind(format!("Category of {}", title))
            .fetch_one(pool)
            .await
            .expect("insert category");
    sqlx::query_scalar(
        r#"
        INSERT INTO books (title, author_id, category_id, publication_year, pages,
                           language, description, total_copies, available_copies)
        VALUES ($1, $2, $3, 1965, 412, 'English', '', $4, $4)
        RETURNING id
        "#,
    )
    .bind(title)
    .bind(author_id)
    .bind(category_id)
    .bind(copies)
    .fetch_one(pool)
    .await
    .expect("insert book")
}

async fn available(pool: &PgPool, book_id: i32) -> i32 {
    sqlx::query_scalar("SELECT available_copies FROM books WHERE id = $1")
        .bind(book_id)
        .fetch_one(pool)
        .await
        .expect("read copies")
}

fn outcome(err: AppError) -> LendingError {
    match err {
        AppError::Lending(outcome) => outcome,
        other => panic!("expected a lending refusal, got {:?}", other),
    }
}

async fn borrow_and_return(lending: &LendingService, who: &Member, book_id: i32) {
    let borrow = lending.borrow_book(who, book_id).await.expect("borrow");
    lending.return_book(who, borrow.id).await.expect("return");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_borrow_then_return_restores_copies(pool: PgPool) {
    let services = services(&pool);
    let book_id = seed_book(&pool, "Dune", 3).await;
    let reader = member(1);

    let borrow = services.lending.borrow_book(&reader, book_id).await.unwrap();
    assert_eq!(available(&pool, book_id).await, 2);
    assert_eq!(
        borrow.expected_return_at - borrow.borrowed_at,
        chrono::Duration::days(14)
    );

    let returned = services.lending.return_book(&reader, borrow.id).await.unwrap();
    assert!(returned.returned_at.is_some());
    assert_eq!(available(&pool, book_id).await, 3);

    let again = services.lending.return_book(&reader, borrow.id).await.unwrap_err();
    assert_eq!(outcome(again), LendingError::NotFoundOrAlreadyReturned);
    assert_eq!(available(&pool, book_id).await, 3);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_cannot_return_someone_elses_borrow(pool: PgPool) {
    let services = services(&pool);
    let book_id = seed_book(&pool, "Emma", 1).await;

    let borrow = services.lending.borrow_book(&member(1), book_id).await.unwrap();
    let err = services.lending.return_book(&member(2), borrow.id).await.unwrap_err();
    assert_eq!(outcome(err), LendingError::NotFoundOrAlreadyReturned);
    assert_eq!(available(&pool, book_id).await, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_duplicate_and_unavailable(pool: PgPool) {
    let services = services(&pool);
    let book_id = seed_book(&pool, "Beloved", 2).await;
    let reader = member(1);

    services.lending.borrow_book(&reader, book_id).await.unwrap();
    let err = services.lending.borrow_book(&reader, book_id).await.unwrap_err();
    assert_eq!(outcome(err), LendingError::DuplicateActiveBorrow);

    services.lending.borrow_book(&member(2), book_id).await.unwrap();
    let err = services.lending.borrow_book(&member(3), book_id).await.unwrap_err();
    assert_eq!(outcome(err), LendingError::Unavailable);
    assert_eq!(available(&pool, book_id).await, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_borrow_limit_boundary(pool: PgPool) {
    let services = services(&pool);
    let reader = member(1);

    let mut books = Vec::new();
    for i in 0..6 {
        books.push(seed_book(&pool, &format!("Volume {}", i), 1).await);
    }

    for book_id in &books[..5] {
        services.lending.borrow_book(&reader, *book_id).await.unwrap();
    }

    let err = services.lending.borrow_book(&reader, books[5]).await.unwrap_err();
    assert_eq!(outcome(err), LendingError::LimitExceeded(5));
    assert_eq!(available(&pool, books[5]).await, 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_staff_borrow_changes_nothing(pool: PgPool) {
    let services = services(&pool);
    let book_id = seed_book(&pool, "Ulysses", 1).await;

    let err = services.lending.borrow_book(&staff(9), book_id).await.unwrap_err();
    assert_eq!(outcome(err), LendingError::ForbiddenRole);
    assert_eq!(available(&pool, book_id).await, 1);

    let borrows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM borrows")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(borrows, 0);
    let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(users, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_race_for_last_copy(pool: PgPool) {
    let services = services(&pool);
    let book_id = seed_book(&pool, "Solaris", 1).await;

    let first = {
        let lending = services.lending.clone();
        tokio::spawn(async move { lending.borrow_book(&member(1), book_id).await })
    };
    let second = {
        let lending = services.lending.clone();
        tokio::spawn(async move { lending.borrow_book(&member(2), book_id).await })
    };

    let results = [first.await.unwrap(), second.await.unwrap()];
    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);

    let refusal = results.into_iter().find_map(Result::err).unwrap();
    assert_eq!(outcome(refusal), LendingError::Unavailable);
    assert_eq!(available(&pool, book_id).await, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_review_after_return(pool: PgPool) {
    let services = services(&pool);
    let book_id = seed_book(&pool, "Middlemarch", 1).await;
    let reader = member(1);
    let review = CreateReview {
        stars: 5,
        comment: Some("Wonderful".to_string()),
    };

    let err = services.lending.add_review(&reader, book_id, &review).await.unwrap_err();
    assert_eq!(outcome(err), LendingError::NeverBorrowed);

    let borrow = services.lending.borrow_book(&reader, book_id).await.unwrap();
    let err = services.lending.add_review(&reader, book_id, &review).await.unwrap_err();
    assert_eq!(outcome(err), LendingError::NeverBorrowed);

    services.lending.return_book(&reader, borrow.id).await.unwrap();
    let created = services.lending.add_review(&reader, book_id, &review).await.unwrap();
    assert_eq!(created.stars, 5);

    let book = services.catalog.get_book(book_id, Some(&reader)).await.unwrap();
    assert_eq!(book.avg_rating.to_string(), "5.0");
    assert_eq!(book.reviews.len(), 1);
    assert_eq!(book.reviews[0].username, "reader1");
    let viewer = book.viewer.unwrap();
    assert!(viewer.borrowed_before);
    assert!(viewer.can_borrow);

    let err = services.lending.add_review(&reader, book_id, &review).await.unwrap_err();
    assert_eq!(outcome(err), LendingError::AlreadyReviewed);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_review_rating_out_of_range(pool: PgPool) {
    let services = services(&pool);
    let book_id = seed_book(&pool, "Persuasion", 1).await;
    let reader = member(1);
    borrow_and_return(&services.lending, &reader, book_id).await;

    let review = CreateReview {
        stars: 6,
        comment: None,
    };
    let err = services.lending.add_review(&reader, book_id, &review).await.unwrap_err();
    assert_eq!(outcome(err), LendingError::InvalidRating);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_average_rating_rounds_to_one_decimal(pool: PgPool) {
    let services = services(&pool);
    let book_id = seed_book(&pool, "Kindred", 3).await;

    for (id, stars) in [(1, 5), (2, 4), (3, 4)] {
        let reader = member(id);
        borrow_and_return(&services.lending, &reader, book_id).await;
        let review = CreateReview {
            stars,
            comment: None,
        };
        services.lending.add_review(&reader, book_id, &review).await.unwrap();
    }

    let book = services.catalog.get_book(book_id, None).await.unwrap();
    assert_eq!(book.avg_rating.to_string(), "4.3");
    assert!(book.viewer.is_none());

    let other = seed_book(&pool, "Unread", 1).await;
    let book = services.catalog.get_book(other, None).await.unwrap();
    assert!(book.avg_rating.is_zero());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_catalog_search_and_counts(pool: PgPool) {
    let services = services(&pool);
    seed_book(&pool, "The Hobbit", 1).await;
    seed_book(&pool, "Hobbit Cookbook 100%", 1).await;
    seed_book(&pool, "Neuromancer", 1).await;

    let query = athenaeum_server::models::book::BookQuery {
        q: Some("hobbit".to_string()),
        ..Default::default()
    };
    let (books, total) = services.catalog.search_books(&query).await.unwrap();
    assert_eq!(total, 2);
    assert_eq!(books.len(), 2);

    let query = athenaeum_server::models::book::BookQuery {
        q: Some("100%".to_string()),
        ..Default::default()
    };
    let (_, total) = services.catalog.search_books(&query).await.unwrap();
    assert_eq!(total, 1);

    let categories = services.catalog.list_categories().await.unwrap();
    assert_eq!(categories.len(), 3);
    assert!(categories.iter().all(|c| c.book_count == 1));

    let home = services.catalog.home().await.unwrap();
    assert_eq!(home.books, 3);
    assert_eq!(home.latest_books.len(), 3);
}
