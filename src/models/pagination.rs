//! Page-number pagination for list views

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::{Author, Book, BookInstanceDetails};
use crate::error::{AppError, AppResult};

/// Query parameters accepted by paginated views
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct PageQuery {
    /// Page number (default: 1)
    pub page: Option<i64>,
}

/// A validated page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
    offset: i64,
}

impl PageRequest {
    /// Pages whose first row lies beyond `i64::MAX` cannot exist and are
    /// reported as not found, like any other page past the end.
    pub fn new(query: &PageQuery, per_page: i64) -> AppResult<Self> {
        let page = query.page.unwrap_or(1);
        if page < 1 {
            return Err(AppError::NotFound(format!("Invalid page {}", page)));
        }
        let offset = (page - 1)
            .checked_mul(per_page)
            .ok_or_else(|| AppError::NotFound(format!("Invalid page {}", page)))?;
        Ok(Self { page, per_page, offset })
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }
}

/// One page of a list view
#[derive(Debug, Serialize, ToSchema)]
#[aliases(
    BookPage = Page<Book>,
    AuthorPage = Page<Author>,
    BookInstancePage = Page<BookInstanceDetails>
)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total number of records across all pages
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub num_pages: i64,
}

impl<T> Page<T> {
    /// Wraps the records of `request`, rejecting pages past the end.
    ///
    /// The first page of an empty list is valid.
    pub fn new(items: Vec<T>, total: i64, request: PageRequest) -> AppResult<Self> {
        let num_pages = if total == 0 {
            1
        } else {
            (total + request.per_page - 1) / request.per_page
        };
        if request.page > num_pages {
            return Err(AppError::NotFound(format!(
                "Page {} is past the last page ({})",
                request.page, num_pages
            )));
        }
        Ok(Self {
            items,
            total,
            page: request.page,
            per_page: request.per_page,
            num_pages,
        })
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
            num_pages: self.num_pages,
        }
    }
}
