use actix_web::{web, HttpResponse};
use sea_orm::DatabaseConnection;
use validator::Validate;

use crate::error::ApiError;
use crate::middleware::AdminUser;
use crate::models::dto::ProductInput;
use crate::services::product_service::ProductService;

use super::{parse_id, IdQuery};

/// GET /api/products - grouped listing, or one product when `?id=` is given
pub async fn get_products(
    query: web::Query<IdQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    match query.id.as_deref().filter(|raw| !raw.is_empty()) {
        Some(raw) => product_detail(db.get_ref(), parse_id(raw)?).await,
        None => {
            let grouped = ProductService::list_grouped(db.get_ref()).await?;
            Ok(HttpResponse::Ok().json(grouped))
        }
    }
}

/// GET /api/products/{id}
pub async fn get_product(
    path: web::Path<String>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    product_detail(db.get_ref(), parse_id(&path)?).await
}

async fn product_detail(db: &DatabaseConnection, id: i32) -> Result<HttpResponse, ApiError> {
    match ProductService::find_detail(db, id).await? {
        Some(detail) => Ok(HttpResponse::Ok().json(detail)),
        None => Err(ApiError::NotFound("Product not found".to_string())),
    }
}

/// POST /api/products (admin)
pub async fn create_product(
    admin: AdminUser,
    body: web::Json<ProductInput>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let input = body.into_inner();

    if input.title.as_deref().map_or(true, |title| title.trim().is_empty()) {
        return Err(ApiError::bad_request("title is required"));
    }
    input.validate()?;

    let product = ProductService::create(db.get_ref(), input).await?;
    tracing::info!(product_id = product.id, by = %admin.0.username, "product created");

    Ok(HttpResponse::Created().json(product))
}

/// PUT /api/products?id=N (admin)
pub async fn update_product_by_query(
    admin: AdminUser,
    query: web::Query<IdQuery>,
    body: web::Json<ProductInput>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let id = query.require_id()?;
    update_product(admin, id, body.into_inner(), db.get_ref()).await
}

/// PUT /api/products/{id} (admin)
pub async fn update_product_by_path(
    admin: AdminUser,
    path: web::Path<String>,
    body: web::Json<ProductInput>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path)?;
    update_product(admin, id, body.into_inner(), db.get_ref()).await
}

async fn update_product(
    admin: AdminUser,
    id: i32,
    input: ProductInput,
    db: &DatabaseConnection,
) -> Result<HttpResponse, ApiError> {
    if input.title.as_deref().is_some_and(|title| title.trim().is_empty()) {
        return Err(ApiError::bad_request("title must not be blank"));
    }
    input.validate()?;

    match ProductService::update(db, id, input).await? {
        Some(product) => {
            tracing::info!(product_id = id, by = %admin.0.username, "product updated");
            Ok(HttpResponse::Ok().json(product))
        }
        None => Err(ApiError::NotFound("Product not found".to_string())),
    }
}

/// DELETE /api/products?id=N (admin)
pub async fn delete_product_by_query(
    admin: AdminUser,
    query: web::Query<IdQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let id = query.require_id()?;
    delete_product(admin, id, db.get_ref()).await
}

/// DELETE /api/products/{id} (admin)
pub async fn delete_product_by_path(
    admin: AdminUser,
    path: web::Path<String>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path)?;
    delete_product(admin, id, db.get_ref()).await
}

async fn delete_product(
    admin: AdminUser,
    id: i32,
    db: &DatabaseConnection,
) -> Result<HttpResponse, ApiError> {
    let removed = ProductService::delete(db, id).await?;
    tracing::info!(product_id = id, removed, by = %admin.0.username, "product deleted");

    Ok(HttpResponse::NoContent().finish())
}

pub fn product_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/products")
            .route(web::get().to(get_products))
            .route(web::post().to(create_product))
            .route(web::put().to(update_product_by_query))
            .route(web::delete().to(delete_product_by_query))
            .default_service(web::route().to(super::method_not_allowed)),
    )
    .service(
        web::resource("/products/{id}")
            .route(web::get().to(get_product))
            .route(web::put().to(update_product_by_path))
            .route(web::delete().to(delete_product_by_path))
            .default_service(web::route().to(super::method_not_allowed)),
    );
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};
    use serde_json::{json, Value};

    use crate::test_support::{test_app, TestContext};

    #[actix_web::test]
    async fn test_grouped_listing() {
        let ctx = TestContext::new().await;
        let tablets = ctx.seed_category("Tablets").await;
        let app = test_app!(ctx);

        for body in [
            json!({"title": "Aspirin", "category_id": tablets.id}),
            json!({"title": "Loose leaf"}),
        ] {
            let req = test::TestRequest::post()
                .uri("/api/products")
                .insert_header(ctx.admin_bearer())
                .set_json(body)
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
        }

        let req = test::TestRequest::get().uri("/api/products").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        let grouped = body.as_object().unwrap();
        assert_eq!(grouped.len(), 2);
        assert_eq!(body["Tablets"].as_array().unwrap().len(), 1);
        assert_eq!(body["Tablets"][0]["title"], "Aspirin");
        assert_eq!(body["Tablets"][0]["categoryName"], "Tablets");
        assert_eq!(body["Other"][0]["title"], "Loose leaf");
        assert!(body["Tablets"][0].get("ingredients").is_none());

        // Every product shows up exactly once, and each is reachable by id
        let ids: Vec<i64> = grouped
            .values()
            .flat_map(|items| items.as_array().unwrap())
            .map(|item| item["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids.len(), 2);
        for id in ids {
            let req = test::TestRequest::get()
                .uri(&format!("/api/products?id={id}"))
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
        }
    }

    #[actix_web::test]
    async fn test_create_then_fetch_round_trip() {
        let ctx = TestContext::new().await;
        let syrups = ctx.seed_category("Syrups").await;
        let app = test_app!(ctx);

        let posted = json!({
            "title": "FerroFlav",
            "title_en": "FerroFlav",
            "description": "وصف",
            "description_en": "Iron and lysine syrup",
            "image_url": "https://cdn.example.com/FerroFlav.jpg",
            "category_id": syrups.id,
            "ingredients": "حديد",
            "ingredients_en": "Iron",
            "usage_instructions_en": "1 tsp daily",
            "side_effects_en": "Mild stomach upset",
            "age_range_en": "Children from 2 years",
            "is_prescription": "false",
            "warning_en": "Keep out of reach of children",
            "model_path": "/models/ferroflav.glb"
        });

        let req = test::TestRequest::post()
            .uri("/api/products")
            .insert_header(ctx.admin_bearer())
            .set_json(&posted)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: Value = test::read_body_json(resp).await;
        let id = created["id"].as_i64().unwrap();

        let req = test::TestRequest::get()
            .uri(&format!("/api/products?id={id}"))
            .to_request();
        let detail: Value = test::call_and_read_body_json(&app, req).await;

        for (key, value) in posted.as_object().unwrap() {
            assert_eq!(&detail[key], value, "field {key}");
        }
        assert_eq!(detail["categoryName"], "Syrups");
        assert!(detail["created_at"].is_string());

        let req = test::TestRequest::get()
            .uri(&format!("/api/products/{id}"))
            .to_request();
        let by_path: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(by_path, detail);
    }

    #[actix_web::test]
    async fn test_create_ignores_unlisted_columns() {
        let ctx = TestContext::new().await;
        let app = test_app!(ctx);

        let req = test::TestRequest::post()
            .uri("/api/products")
            .insert_header(ctx.admin_bearer())
            .set_json(json!({"title": "Aspirin", "id": 999, "created_at": "1999-01-01T00:00:00Z"}))
            .to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;

        assert_ne!(created["id"], 999);
        assert_ne!(created["created_at"], "1999-01-01T00:00:00Z");
        assert_eq!(created["is_prescription"], "false");
    }

    #[actix_web::test]
    async fn test_create_requires_title() {
        let ctx = TestContext::new().await;
        let app = test_app!(ctx);

        for body in [json!({"description": "no title"}), json!({"title": "   "})] {
            let req = test::TestRequest::post()
                .uri("/api/products")
                .insert_header(ctx.admin_bearer())
                .set_json(body)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[actix_web::test]
    async fn test_mutations_require_admin_token() {
        let ctx = TestContext::new().await;
        let app = test_app!(ctx);

        let req = test::TestRequest::post()
            .uri("/api/products")
            .set_json(json!({"title": "Aspirin"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::delete()
            .uri("/api/products?id=1")
            .insert_header(("Authorization", "Bearer forged.token.value"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::put()
            .uri("/api/products?id=1")
            .insert_header(("Authorization", format!("Bearer {}", ctx.token_for("editor"))))
            .set_json(json!({"title": "Hijacked"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"message": "Admin role required"}));
    }

    #[actix_web::test]
    async fn test_partial_update() {
        let ctx = TestContext::new().await;
        let app = test_app!(ctx);

        let req = test::TestRequest::post()
            .uri("/api/products")
            .insert_header(ctx.admin_bearer())
            .set_json(json!({"title": "Aspirin", "warning": "Not for children"}))
            .to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;
        let id = created["id"].as_i64().unwrap();

        let req = test::TestRequest::put()
            .uri(&format!("/api/products?id={id}"))
            .insert_header(ctx.admin_bearer())
            .set_json(json!({"title_en": "Aspirin EN", "is_prescription": true}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let updated: Value = test::read_body_json(resp).await;

        assert_eq!(updated["title"], "Aspirin");
        assert_eq!(updated["title_en"], "Aspirin EN");
        assert_eq!(updated["warning"], "Not for children");
        assert_eq!(updated["is_prescription"], "true");

        // Empty body leaves the row as is
        let req = test::TestRequest::put()
            .uri(&format!("/api/products/{id}"))
            .insert_header(ctx.admin_bearer())
            .set_json(json!({}))
            .to_request();
        let unchanged: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(unchanged, updated);
    }

    #[actix_web::test]
    async fn test_update_missing_product() {
        let ctx = TestContext::new().await;
        let app = test_app!(ctx);

        let req = test::TestRequest::put()
            .uri("/api/products?id=404")
            .insert_header(ctx.admin_bearer())
            .set_json(json!({"title": "Ghost"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"message": "Product not found"}));

        let req = test::TestRequest::put()
            .uri("/api/products")
            .insert_header(ctx.admin_bearer())
            .set_json(json!({"title": "Ghost"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_delete_is_idempotent() {
        let ctx = TestContext::new().await;
        let app = test_app!(ctx);

        let req = test::TestRequest::post()
            .uri("/api/products")
            .insert_header(ctx.admin_bearer())
            .set_json(json!({"title": "Aspirin"}))
            .to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;
        let id = created["id"].as_i64().unwrap();

        for _ in 0..2 {
            let req = test::TestRequest::delete()
                .uri(&format!("/api/products?id={id}"))
                .insert_header(ctx.admin_bearer())
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);
        }

        let req = test::TestRequest::get()
            .uri(&format!("/api/products?id={id}"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_bad_ids_and_verbs() {
        let ctx = TestContext::new().await;
        let app = test_app!(ctx);

        let req = test::TestRequest::get().uri("/api/products?id=abc").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get().uri("/api/products/abc").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::patch().uri("/api/products").to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
    }

    #[actix_web::test]
    async fn test_grouped_listing_keeps_row_order_of_categories() {
        let ctx = TestContext::new().await;
        let tablets = ctx.seed_category("Tablets").await;
        let creams = ctx.seed_category("Creams").await;
        let app = test_app!(ctx);

        for body in [
            json!({"title": "Panadol", "category_id": tablets.id}),
            json!({"title": "Fucidin", "category_id": creams.id}),
        ] {
            let req = test::TestRequest::post()
                .uri("/api/products")
                .insert_header(ctx.admin_bearer())
                .set_json(body)
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
        }

        let req = test::TestRequest::get().uri("/api/products").to_request();
        let raw = test::call_and_read_body(&app, req).await;
        let raw = std::str::from_utf8(&raw).unwrap();

        let tablets_at = raw.find("\"Tablets\"").unwrap();
        let creams_at = raw.find("\"Creams\"").unwrap();
        assert!(tablets_at < creams_at, "{raw}");
    }

    #[actix_web::test]
    async fn test_update_rejects_blank_title() {
        let ctx = TestContext::new().await;
        let app = test_app!(ctx);

        let req = test::TestRequest::post()
            .uri("/api/products")
            .insert_header(ctx.admin_bearer())
            .set_json(json!({"title": "Aspirin"}))
            .to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;
        let id = created["id"].as_i64().unwrap();

        let req = test::TestRequest::put()
            .uri(&format!("/api/products/{id}"))
            .insert_header(ctx.admin_bearer())
            .set_json(json!({"title": "   "}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get()
            .uri(&format!("/api/products/{id}"))
            .to_request();
        let stored: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(stored["title"], "Aspirin");
    }

    #[actix_web::test]
    async fn test_unknown_category_is_bad_request() {
        let ctx = TestContext::new().await;
        let app = test_app!(ctx);

        let req = test::TestRequest::post()
            .uri("/api/products")
            .insert_header(ctx.admin_bearer())
            .set_json(json!({"title": "Aspirin", "category_id": 999}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"message": "Referenced record does not exist"}));
    }
}
