//! Loans service: borrowed copies, renewals, lending and returns

use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;
use validator::ValidationErrors;

use crate::{
    clock::Clock,
    error::{AppError, AppResult},
    forms::{self, BookInstanceForm, LendForm, RenewBookForm},
    models::{BookInstance, BookInstanceDetails, LoanStatus, Page, PageQuery, PageRequest},
    repository::Repository,
};

/// Loans listed per page for the borrower's own view
pub const MY_LOANS_PER_PAGE: i64 = 3;

/// Loans listed per page for the librarian view
pub const ALL_LOANS_PER_PAGE: i64 = 10;

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
    clock: Arc<dyn Clock>,
}

impl LoansService {
    pub fn new(repository: Repository, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    async fn list_on_loan(
        &self,
        borrower_id: Option<i32>,
        query: &PageQuery,
        per_page: i64,
    ) -> AppResult<Page<BookInstanceDetails>> {
        let request = PageRequest::new(query, per_page)?;
        let (instances, total) = self
            .repository
            .book_instances
            .list_on_loan(borrower_id, request.offset(), request.limit())
            .await?;
        let today = self.today();
        Ok(Page::new(instances, total, request)?.map(|i| BookInstanceDetails::new(i, today)))
    }

    /// Copies on loan to `user_id`, soonest due first
    pub async fn borrowed_by_user(
        &self,
        user_id: i32,
        query: &PageQuery,
    ) -> AppResult<Page<BookInstanceDetails>> {
        self.list_on_loan(Some(user_id), query, MY_LOANS_PER_PAGE).await
    }

    /// Every copy on loan, soonest due first
    pub async fn all_borrowed(&self, query: &PageQuery) -> AppResult<Page<BookInstanceDetails>> {
        self.list_on_loan(None, query, ALL_LOANS_PER_PAGE).await
    }

    /// The copy to renew and the date offered by default
    pub async fn renewal_form(&self, id: Uuid) -> AppResult<(BookInstanceDetails, NaiveDate)> {
        let instance = self.repository.book_instances.get(id).await?;
        let today = self.today();
        Ok((
            BookInstanceDetails::new(instance, today),
            forms::suggested_renewal_date(today),
        ))
    }

    /// Sets a new due-back date on a copy. Nothing is written unless the date is valid.
    pub async fn renew(&self, id: Uuid, form: &RenewBookForm) -> AppResult<NaiveDate> {
        self.repository.book_instances.get(id).await?;
        let due_back = form.clean(self.today())?;
        self.repository.book_instances.set_due_back(id, due_back).await?;
        tracing::info!("Renewed book instance {} until {}", id, due_back);
        Ok(due_back)
    }

    pub async fn create_instance(&self, form: &BookInstanceForm) -> AppResult<BookInstance> {
        let instance = form.clean()?;
        if !self.repository.books.exists(instance.book_id).await? {
            let mut errors = ValidationErrors::new();
            errors.add("book", forms::invalid_choice());
            return Err(AppError::Form(errors));
        }

        let created = self.repository.book_instances.create(Uuid::new_v4(), &instance).await?;
        tracing::info!("Created book instance {} of book {}", created.id, instance.book_id);
        Ok(created)
    }

    /// Puts an available copy on loan
    pub async fn lend(&self, id: Uuid, form: &LendForm) -> AppResult<BookInstance> {
        let instance = self.repository.book_instances.get(id).await?;
        let lend = form.clean(self.today())?;

        if !self.repository.users.exists(lend.borrower_id).await? {
            let mut errors = ValidationErrors::new();
            errors.add("borrower", forms::invalid_choice());
            return Err(AppError::Form(errors));
        }
        if instance.status != Some(LoanStatus::Available) {
            return Err(not_available(&instance));
        }
        if !self
            .repository
            .book_instances
            .lend(id, lend.borrower_id, lend.due_back)
            .await?
        {
            return Err(not_available(&instance));
        }

        tracing::info!(
            "Lent book instance {} to user {} until {}",
            id,
            lend.borrower_id,
            lend.due_back
        );
        self.repository.book_instances.get(id).await
    }

    /// Makes a copy on loan available again
    pub async fn mark_returned(&self, id: Uuid) -> AppResult<BookInstance> {
        let instance = self.repository.book_instances.get(id).await?;
        if !instance.is_on_loan() || !self.repository.book_instances.mark_returned(id).await? {
            return Err(AppError::BusinessRule(format!(
                "Book instance {} is not on loan",
                id
            )));
        }
        tracing::info!("Book instance {} returned", id);
        self.repository.book_instances.get(id).await
    }
}

fn not_available(instance: &BookInstance) -> AppError {
    AppError::BusinessRule(format!(
        "Book instance {} is not available ({})",
        instance.id,
        instance.status.map(|s| s.label()).unwrap_or("no status")
    ))
}
