//! Lending policy engine
//!
//! Pure decision rules for borrowing, returning and reviewing books. Nothing in
//! this module performs I/O: the repository layer loads the relevant state
//! inside a transaction, asks the rules for a verdict and only then writes.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::models::user::Member;

/// Maximum number of simultaneously active borrows per member
pub const MAX_ACTIVE_BORROWS: i64 = 5;

/// Loan period, in days, used to compute the expected return date
pub const LOAN_PERIOD_DAYS: i64 = 14;

/// Lowest and highest accepted review ratings
pub const MIN_STARS: i64 = 1;
pub const MAX_STARS: i64 = 5;

/// Error taxonomy shared by every refusal of the policy engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    PermissionDenied,
    ResourceUnavailable,
    DuplicateState,
    LimitExceeded,
    NotFound,
    Validation,
}

/// Refusal outcomes of the lending policy engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LendingError {
    #[error("Staff accounts cannot borrow or review from the member interface")]
    ForbiddenRole,

    #[error("The book is currently not available")]
    Unavailable,

    #[error("You are already borrowing this book")]
    DuplicateActiveBorrow,

    #[error("You have reached your borrowing limit ({0})")]
    LimitExceeded(i64),

    #[error("Borrow not found or already returned")]
    NotFoundOrAlreadyReturned,

    #[error("You cannot review a book that you have not previously borrowed")]
    NeverBorrowed,

    #[error("You already rated this book")]
    AlreadyReviewed,

    #[error("Rating must be between 1 and 5 stars")]
    InvalidRating,
}

impl LendingError {
    /// Stable outcome name exposed to clients
    pub fn code(&self) -> &'static str {
        match self {
            LendingError::ForbiddenRole => "forbidden-role",
            LendingError::Unavailable => "unavailable",
            LendingError::DuplicateActiveBorrow => "duplicate-active-borrow",
            LendingError::LimitExceeded(_) => "limit-exceeded",
            LendingError::NotFoundOrAlreadyReturned => "not-found-or-already-returned",
            LendingError::NeverBorrowed => "never-borrowed",
            LendingError::AlreadyReviewed => "already-reviewed",
            LendingError::InvalidRating => "invalid-rating",
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            LendingError::ForbiddenRole | LendingError::NeverBorrowed => FailureKind::PermissionDenied,
            LendingError::Unavailable => FailureKind::ResourceUnavailable,
            LendingError::DuplicateActiveBorrow | LendingError::AlreadyReviewed => {
                FailureKind::DuplicateState
            }
            LendingError::LimitExceeded(_) => FailureKind::LimitExceeded,
            LendingError::NotFoundOrAlreadyReturned => FailureKind::NotFound,
            LendingError::InvalidRating => FailureKind::Validation,
        }
    }
}

/// Copy counters of a single book, as read under a row lock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookStock {
    pub total_copies: i32,
    pub available_copies: i32,
}

impl BookStock {
    pub fn new(total_copies: i32, available_copies: i32) -> Self {
        Self {
            total_copies,
            available_copies,
        }
    }

    pub fn is_available(&self) -> bool {
        self.available_copies > 0
    }

    /// Take one copy out. Fails when no copy is left.
    pub fn checkout(self) -> Result<Self, LendingError> {
        if !self.is_available() {
            return Err(LendingError::Unavailable);
        }
        Ok(Self {
            available_copies: self.available_copies - 1,
            ..self
        })
    }

    /// Put one copy back, never above the total.
    pub fn checkin(self) -> Self {
        Self {
            available_copies: (self.available_copies + 1).min(self.total_copies),
            ..self
        }
    }
}

/// What the borrow ledger says about a member, relative to one book
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BorrowerLedger {
    /// An active borrow exists for this (member, book) pair
    pub active_for_book: bool,
    /// Number of active borrows of the member, all books included
    pub active_total: i64,
}

/// What the ledger and review store say about a member, relative to one book
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReviewLedger {
    /// A closed (returned) borrow exists for this (member, book) pair
    pub borrowed_before: bool,
    pub already_reviewed: bool,
}

/// A validated star rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Stars(i16);

impl Stars {
    pub fn value(self) -> i16 {
        self.0
    }
}

impl TryFrom<i64> for Stars {
    type Error = LendingError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (MIN_STARS..=MAX_STARS).contains(&value) {
            // Range-checked above, fits in i16
            Ok(Stars(value as i16))
        } else {
            Err(LendingError::InvalidRating)
        }
    }
}

/// Tunable limits of the lending policy
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct LendingRules {
    #[serde(default = "default_max_active_borrows")]
    pub max_active_borrows: i64,
    #[serde(default = "default_loan_period_days")]
    pub loan_period_days: i64,
}

fn default_max_active_borrows() -> i64 {
    MAX_ACTIVE_BORROWS
}

fn default_loan_period_days() -> i64 {
    LOAN_PERIOD_DAYS
}

impl Default for LendingRules {
    fn default() -> Self {
        Self {
            max_active_borrows: MAX_ACTIVE_BORROWS,
            loan_period_days: LOAN_PERIOD_DAYS,
        }
    }
}

impl LendingRules {
    /// Decide whether `member` may borrow a copy of the book.
    ///
    /// Checks run in a fixed order so that a member always gets the same
    /// outcome for the same state: role, availability, duplicate, limit.
    /// On success the stock after checkout is returned.
    pub fn check_borrow(
        &self,
        member: &Member,
        stock: BookStock,
        ledger: BorrowerLedger,
    ) -> Result<BookStock, LendingError> {
        if member.is_staff {
            return Err(LendingError::ForbiddenRole);
        }
        if !stock.is_available() {
            return Err(LendingError::Unavailable);
        }
        if ledger.active_for_book {
            return Err(LendingError::DuplicateActiveBorrow);
        }
        if ledger.active_total >= self.max_active_borrows {
            return Err(LendingError::LimitExceeded(self.max_active_borrows));
        }
        stock.checkout()
    }

    /// Expected return date of a borrow started at `borrowed_at`
    pub fn due_date(&self, borrowed_at: DateTime<Utc>) -> DateTime<Utc> {
        borrowed_at + Duration::days(self.loan_period_days)
    }

    /// Stock after the return of one copy
    pub fn check_return(&self, stock: BookStock) -> BookStock {
        stock.checkin()
    }

    /// Decide whether `member` may review the book with `stars`.
    pub fn check_review(
        &self,
        member: &Member,
        ledger: ReviewLedger,
        stars: i64,
    ) -> Result<Stars, LendingError> {
        if member.is_staff {
            return Err(LendingError::ForbiddenRole);
        }
        if !ledger.borrowed_before {
            return Err(LendingError::NeverBorrowed);
        }
        if ledger.already_reviewed {
            return Err(LendingError::AlreadyReviewed);
        }
        Stars::try_from(stars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn reader() -> Member {
        Member {
            id: 7,
            username: "reader".to_string(),
            is_staff: false,
        }
    }

    fn staff() -> Member {
        Member {
            id: 1,
            username: "librarian".to_string(),
            is_staff: true,
        }
    }

    fn ledger(active_for_book: bool, active_total: i64) -> BorrowerLedger {
        BorrowerLedger {
            active_for_book,
            active_total,
        }
    }

    #[test]
    fn test_borrow_decrements_stock() {
        let rules = LendingRules::default();
        let after = rules
            .check_borrow(&reader(), BookStock::new(3, 2), ledger(false, 0))
            .unwrap();
        assert_eq!(after, BookStock::new(3, 1));
    }

    #[test]
    fn test_borrow_last_copy_then_unavailable() {
        let rules = LendingRules::default();
        let after = rules
            .check_borrow(&reader(), BookStock::new(1, 1), ledger(false, 0))
            .unwrap();
        assert_eq!(after.available_copies, 0);

        let other = Member {
            id: 8,
            username: "other".to_string(),
            is_staff: false,
        };
        assert_eq!(
            rules.check_borrow(&other, after, ledger(false, 0)),
            Err(LendingError::Unavailable)
        );
    }

    #[test]
    fn test_staff_is_refused_before_anything_else() {
        let rules = LendingRules::default();
        let result = rules.check_borrow(&staff(), BookStock::new(0, 0), ledger(true, 9));
        assert_eq!(result, Err(LendingError::ForbiddenRole));
        assert_eq!(LendingError::ForbiddenRole.kind(), FailureKind::PermissionDenied);
    }

    #[test]
    fn test_duplicate_active_borrow() {
        let rules = LendingRules::default();
        let result = rules.check_borrow(&reader(), BookStock::new(2, 1), ledger(true, 1));
        assert_eq!(result, Err(LendingError::DuplicateActiveBorrow));
        assert_eq!(result.unwrap_err().code(), "duplicate-active-borrow");
    }

    #[test]
    fn test_limit_boundary() {
        let rules = LendingRules::default();
        assert!(rules
            .check_borrow(&reader(), BookStock::new(1, 1), ledger(false, 4))
            .is_ok());
        let refused = rules.check_borrow(&reader(), BookStock::new(1, 1), ledger(false, 5));
        assert_eq!(refused, Err(LendingError::LimitExceeded(5)));
        assert_eq!(refused.unwrap_err().kind(), FailureKind::LimitExceeded);
    }

    #[test]
    fn test_custom_limit() {
        let rules = LendingRules {
            max_active_borrows: 2,
            loan_period_days: 7,
        };
        assert_eq!(
            rules.check_borrow(&reader(), BookStock::new(1, 1), ledger(false, 2)),
            Err(LendingError::LimitExceeded(2))
        );
    }

    #[test]
    fn test_borrow_then_return_restores_stock() {
        let rules = LendingRules::default();
        let before = BookStock::new(4, 3);
        let borrowed = rules.check_borrow(&reader(), before, ledger(false, 0)).unwrap();
        assert_eq!(rules.check_return(borrowed), before);
    }

    #[test]
    fn test_checkin_never_exceeds_total() {
        let full = BookStock::new(2, 2);
        assert_eq!(full.checkin(), full);
        assert_eq!(BookStock::new(0, 0).checkout(), Err(LendingError::Unavailable));
    }

    #[test]
    fn test_due_date_is_fourteen_days_later() {
        let rules = LendingRules::default();
        let start = Utc.with_ymd_and_hms(2024, 2, 20, 10, 0, 0).unwrap();
        let due = rules.due_date(start);
        assert_eq!(due, Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_review_requires_closed_borrow() {
        let rules = LendingRules::default();
        let never = ReviewLedger {
            borrowed_before: false,
            already_reviewed: false,
        };
        assert_eq!(
            rules.check_review(&reader(), never, 5),
            Err(LendingError::NeverBorrowed)
        );
    }

    #[test]
    fn test_review_once() {
        let rules = LendingRules::default();
        let returned = ReviewLedger {
            borrowed_before: true,
            already_reviewed: false,
        };
        assert_eq!(rules.check_review(&reader(), returned, 5).unwrap().value(), 5);

        let reviewed = ReviewLedger {
            borrowed_before: true,
            already_reviewed: true,
        };
        assert_eq!(
            rules.check_review(&reader(), reviewed, 5),
            Err(LendingError::AlreadyReviewed)
        );
    }

    #[test]
    fn test_review_rating_range() {
        let rules = LendingRules::default();
        let returned = ReviewLedger {
            borrowed_before: true,
            already_reviewed: false,
        };
        assert_eq!(
            rules.check_review(&reader(), returned, 0),
            Err(LendingError::InvalidRating)
        );
        assert_eq!(
            rules.check_review(&reader(), returned, 6),
            Err(LendingError::InvalidRating)
        );
        assert_eq!(
            rules.check_review(&reader(), returned, 5_000_000_000),
            Err(LendingError::InvalidRating)
        );
        assert_eq!(
            rules.check_review(&reader(), returned, i64::MIN),
            Err(LendingError::InvalidRating)
        );
        assert!(rules.check_review(&reader(), returned, 1).is_ok());
        assert_eq!(
            rules.check_review(&staff(), returned, 3),
            Err(LendingError::ForbiddenRole)
        );
    }

    #[test]
    fn test_outcome_codes_are_distinct() {
        let all = [
            LendingError::ForbiddenRole,
            LendingError::Unavailable,
            LendingError::DuplicateActiveBorrow,
            LendingError::LimitExceeded(5),
            LendingError::NotFoundOrAlreadyReturned,
            LendingError::NeverBorrowed,
            LendingError::AlreadyReviewed,
            LendingError::InvalidRating,
        ];
        let mut codes: Vec<&str> = all.iter().map(|e| e.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), all.len());
    }
}
