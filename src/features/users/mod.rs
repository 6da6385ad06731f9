//! User account administration.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | POST | `/api/users` | Register an account (superadmin) |
//! | GET | `/api/users` | List accounts, `include_deleted` / `only_deleted` flags |
//! | GET | `/api/users/stats` | Ledger counts and per-role totals |
//! | GET | `/api/users/category-admin` | Admin owning `category_id` |
//! | GET | `/api/users/{id}` | Get one account, deleted or not |
//! | PUT | `/api/users/{id}` | Edit name, email or role |
//! | DELETE | `/api/users/{id}` | Soft delete |
//! | PATCH | `/api/users/{id}/restore` | Undo a soft delete |
//! | PATCH | `/api/users/{id}/toggle-active` | Flip the active flag |
//! | DELETE | `/api/users/{id}/permanent` | Remove for good (superadmin) |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use routes::routes;
pub use services::UserService;
