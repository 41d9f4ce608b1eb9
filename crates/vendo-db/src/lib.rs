//! # vendo-db: Database Layer for the Vendo Commerce Engine
//!
//! SQLite storage with sqlx: pool management, embedded migrations, the
//! schema capability resolver and one repository per aggregate.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Vendo Data Flow                                  │
//! │                                                                         │
//! │  vendo-engine service (e.g. SaleComposer::store)                        │
//! │       │  begins ONE transaction                                         │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                     vendo-db (THIS CRATE)                       │    │
//! │  │                                                                 │    │
//! │  │   ┌───────────────┐   ┌────────────────┐   ┌──────────────┐    │    │
//! │  │   │   Database    │   │  Repositories  │   │  Migrations  │    │    │
//! │  │   │   (pool.rs)   │   │ sale, stock,   │   │  (embedded)  │    │    │
//! │  │   │               │   │ journal, ...   │   │              │    │    │
//! │  │   │ SqlitePool    │◄──│ mutations take │   │ 001_init.sql │    │    │
//! │  │   │ Capabilities  │   │ &mut conn      │   │ 002_idx.sql  │    │    │
//! │  │   └───────────────┘   └────────────────┘   └──────────────┘    │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (WAL, foreign keys, busy timeout)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`capability`] - Schema capability resolver (resolved once, cached)
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations

// =============================================================================
// Module Declarations
// =============================================================================

pub mod capability;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use capability::SchemaCapabilities;
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::finance::FinanceRepository;
pub use repository::journal::JournalRepository;
pub use repository::product::ProductRepository;
pub use repository::sale::SaleRepository;
pub use repository::sequence::SequenceRepository;
pub use repository::stock::StockRepository;
pub use repository::transfer::TransferRepository;
