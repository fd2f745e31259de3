// ============================================================================
// MODELS
// ============================================================================
//
// One SeaORM entity per table, plus the request/response shapes in `dto`.
//
//   - users : back office accounts (provisioned at startup, no signup)
//   - categories : static reference data, seeded once
//   - products : bilingual catalog entries, `category_id` → categories.id
//   - events : timeline entries with an ordered image gallery
//   - health : health check response
//   - dto : allow-listed inputs, grouped listing, detail view
//
// ============================================================================

pub mod users;
pub mod categories;
pub mod products;
pub mod events;
pub mod health;
pub mod dto;
