//! Lending service: borrow, return and review on behalf of a member

use crate::{
    error::{AppError, AppResult},
    models::{
        borrow::{Borrow, MyBooks},
        review::{CreateReview, Review},
        user::Member,
    },
    policy::LendingRules,
    repository::Repository,
};

#[derive(Clone)]
pub struct LendingService {
    repository: Repository,
    rules: LendingRules,
}

/// Log policy refusals at info level, leave other errors to the caller
fn trace_refusal(err: AppError, action: &str, member: &Member, target: i32) -> AppError {
    if let AppError::Lending(outcome) = &err {
        tracing::info!(
            member_id = member.id,
            target,
            outcome = outcome.code(),
            "{} refused",
            action
        );
    }
    err
}

impl LendingService {
    pub fn new(repository: Repository, rules: LendingRules) -> Self {
        Self { repository, rules }
    }

    /// Borrow one copy of a book
    pub async fn borrow_book(&self, member: &Member, book_id: i32) -> AppResult<Borrow> {
        let borrow = self
            .repository
            .borrows
            .create(member, book_id, &self.rules)
            .await
            .map_err(|e| trace_refusal(e, "Borrow", member, book_id))?;

        tracing::info!(
            member_id = member.id,
            book_id,
            borrow_id = borrow.id,
            due = %borrow.expected_return_at,
            "Book borrowed"
        );
        Ok(borrow)
    }

    /// Return a borrowed book
    pub async fn return_book(&self, member: &Member, borrow_id: i32) -> AppResult<Borrow> {
        let borrow = self
            .repository
            .borrows
            .return_borrow(member, borrow_id, &self.rules)
            .await
            .map_err(|e| trace_refusal(e, "Return", member, borrow_id))?;

        tracing::info!(
            member_id = member.id,
            book_id = borrow.book_id,
            borrow_id,
            "Book returned"
        );
        Ok(borrow)
    }

    /// Review a previously returned book
    pub async fn add_review(
        &self,
        member: &Member,
        book_id: i32,
        review: &CreateReview,
    ) -> AppResult<Review> {
        let created = self
            .repository
            .reviews
            .create(
                member,
                book_id,
                review.stars,
                review.comment.as_deref(),
                &self.rules,
            )
            .await
            .map_err(|e| trace_refusal(e, "Review", member, book_id))?;

        tracing::info!(member_id = member.id, book_id, stars = created.stars, "Review added");
        Ok(created)
    }

    /// Active borrows and history of a member
    pub async fn my_books(&self, member: &Member) -> AppResult<MyBooks> {
        let borrows = self.repository.borrows.list_for_member(member.id).await?;
        Ok(MyBooks::split(borrows))
    }
}
