//! User model, account rights and JWT claims

use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;

/// Right level on one area of the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rights {
    None = 0,
    Read = 1,
    Write = 2,
}

impl From<char> for Rights {
    fn from(c: char) -> Self {
        match c {
            'r' | 'R' => Rights::Read,
            'w' | 'W' => Rights::Write,
            _ => Rights::None,
        }
    }
}

impl From<Option<String>> for Rights {
    fn from(s: Option<String>) -> Self {
        s.and_then(|s| s.chars().next())
            .map(Rights::from)
            .unwrap_or(Rights::None)
    }
}

/// Account type slug (string identifier)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AccountTypeSlug {
    Reader,
    Librarian,
    Admin,
}

impl AccountTypeSlug {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountTypeSlug::Reader => "reader",
            AccountTypeSlug::Librarian => "librarian",
            AccountTypeSlug::Admin => "admin",
        }
    }
}

impl std::fmt::Display for AccountTypeSlug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AccountTypeSlug {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reader" => Ok(AccountTypeSlug::Reader),
            "librarian" => Ok(AccountTypeSlug::Librarian),
            "admin" => Ok(AccountTypeSlug::Admin),
            _ => Err(format!("Invalid account type slug: {}", s)),
        }
    }
}

// SQLx conversion for AccountTypeSlug
impl sqlx::Type<Postgres> for AccountTypeSlug {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for AccountTypeSlug {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for AccountTypeSlug {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

/// User model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: i32,
    pub login: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing)]
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub account_type: AccountTypeSlug,
}

/// Fields of a user account to create
#[derive(Debug, Clone)]
pub struct NewUser {
    pub login: String,
    /// Already hashed
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub account_type: AccountTypeSlug,
}

/// Rights columns of an account type row
#[derive(Debug, Clone, FromRow)]
pub struct AccountTypeRightsRow {
    pub loans_rights: Option<String>,
    pub authors_rights: Option<String>,
    pub books_rights: Option<String>,
}

/// User rights structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRights {
    pub loans_rights: Rights,
    pub authors_rights: Rights,
    pub books_rights: Rights,
}

impl Default for UserRights {
    fn default() -> Self {
        Self {
            loans_rights: Rights::None,
            authors_rights: Rights::None,
            books_rights: Rights::None,
        }
    }
}

impl From<AccountTypeRightsRow> for UserRights {
    fn from(row: AccountTypeRightsRow) -> Self {
        Self {
            loans_rights: Rights::from(row.loans_rights),
            authors_rights: Rights::from(row.authors_rights),
            books_rights: Rights::from(row.books_rights),
        }
    }
}

/// JWT Claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: i32,
    /// Session the token was issued for; keys session-scoped state
    pub sid: Uuid,
    pub account_type: AccountTypeSlug,
    pub rights: UserRights,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    // Authorization checks
    pub fn require_renew_loans(&self) -> Result<(), AppError> {
        if self.rights.loans_rights as u8 >= Rights::Write as u8 {
            Ok(())
        } else {
            Err(AppError::Authorization("Insufficient rights to manage loans".to_string()))
        }
    }

    pub fn require_write_authors(&self) -> Result<(), AppError> {
        if self.rights.authors_rights as u8 >= Rights::Write as u8 {
            Ok(())
        } else {
            Err(AppError::Authorization("Insufficient rights to write authors".to_string()))
        }
    }

    pub fn require_write_books(&self) -> Result<(), AppError> {
        if self.rights.books_rights as u8 >= Rights::Write as u8 {
            Ok(())
        } else {
            Err(AppError::Authorization("Insufficient rights to write books".to_string()))
        }
    }
}
