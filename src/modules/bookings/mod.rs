//! Reservation module for a single bookable unit.
//!
//! `GET /dates` resolves an availability window against the occupancy index;
//! `POST/PUT/DELETE /bookings` run the booking lifecycle; `DELETE /dates` clears the index.

pub mod availability;
pub mod clock;
pub mod error;
pub mod horizon;
pub mod models;
pub mod routes;
pub mod service;
pub mod store;
pub mod validator;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use lodge_kernel::{InitCtx, Migration, Module};
use once_cell::sync::OnceCell;

use clock::{Clock, SystemClock};
use horizon::BookingPolicy;
use service::BookingService;

pub struct BookingsModule {
    clock: Arc<dyn Clock>,
    service: OnceCell<Arc<BookingService>>,
}

impl BookingsModule {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            service: OnceCell::new(),
        }
    }

    /// The service, once `init` has run.
    pub fn service(&self) -> Option<&Arc<BookingService>> {
        self.service.get()
    }
}

#[async_trait]
impl Module for BookingsModule {
    fn name(&self) -> &'static str {
        "bookings"
    }

    fn base_path(&self) -> String {
        "/".to_string()
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let policy = BookingPolicy::from_settings(&ctx.settings.booking)?;

        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            time_zone = policy.time_zone.name(),
            max_nights = policy.max_nights,
            horizon_months = policy.horizon_months,
            "bookings module initialized"
        );

        let service = Arc::new(BookingService::new(ctx.db.clone(), policy, self.clock.clone()));
        if self.service.set(service).is_err() {
            anyhow::bail!("bookings module initialized twice");
        }
        Ok(())
    }

    fn routes(&self) -> Router {
        match self.service.get() {
            Some(service) => routes::router(service.clone()),
            None => {
                tracing::warn!(module = self.name(), "routes requested before init; none mounted");
                Router::new()
            }
        }
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi_fragment())
    }

    fn migrations(&self) -> Vec<Migration> {
        store::MIGRATIONS.to_vec()
    }
}

/// Create the bookings module on the wall clock
pub fn create_module() -> Arc<BookingsModule> {
    Arc::new(BookingsModule::new(Arc::new(SystemClock)))
}

fn openapi_fragment() -> serde_json::Value {
    let bad_request = serde_json::json!({
        "description": "Bad parameters, unknown booking, ownership mismatch, or date conflict",
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    });
    let booking_body = serde_json::json!({
        "required": true,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/BookingRequest" }
            }
        }
    });
    let booking_response = |description: &str| {
        serde_json::json!({
            "description": description,
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/Booking" }
                }
            }
        })
    };
    let id_param = serde_json::json!([{
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "integer", "format": "int64" }
    }]);

    serde_json::json!({
        "paths": {
            "/dates": {
                "get": {
                    "summary": "Per-date availability between tomorrow and one month out",
                    "tags": ["Bookings"],
                    "parameters": [
                        { "name": "from", "in": "query", "required": false,
                          "schema": { "type": "string", "format": "date" } },
                        { "name": "to", "in": "query", "required": false,
                          "schema": { "type": "string", "format": "date" } }
                    ],
                    "responses": {
                        "200": {
                            "description": "Availability window",
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/Availability" }
                                }
                            }
                        },
                        "400": bad_request
                    }
                },
                "delete": {
                    "summary": "Clear the occupancy index (maintenance)",
                    "tags": ["Maintenance"],
                    "responses": { "200": { "description": "Index cleared" } }
                }
            },
            "/bookings": {
                "post": {
                    "summary": "Create a booking of 1 to 3 nights",
                    "tags": ["Bookings"],
                    "requestBody": booking_body,
                    "responses": {
                        "201": booking_response("Booking created"),
                        "400": bad_request
                    }
                }
            },
            "/bookings/{id}": {
                "get": {
                    "summary": "Fetch a booking",
                    "tags": ["Bookings"],
                    "parameters": id_param,
                    "responses": {
                        "200": booking_response("Booking"),
                        "400": bad_request
                    }
                },
                "put": {
                    "summary": "Move a booking to new dates",
                    "tags": ["Bookings"],
                    "parameters": id_param,
                    "requestBody": booking_body,
                    "responses": {
                        "200": booking_response("Booking updated"),
                        "400": bad_request
                    }
                },
                "delete": {
                    "summary": "Cancel a booking",
                    "tags": ["Bookings"],
                    "parameters": id_param,
                    "responses": {
                        "204": { "description": "Booking deleted" },
                        "400": bad_request
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "BookingRequest": {
                    "type": "object",
                    "properties": {
                        "email": { "type": "string" },
                        "fullName": { "type": "string" },
                        "checkIn": { "type": "string", "format": "date" },
                        "checkOut": { "type": "string", "format": "date" }
                    },
                    "required": ["email", "fullName", "checkIn", "checkOut"]
                },
                "Booking": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer", "format": "int64" },
                        "createdTime": { "type": "integer", "format": "int64" },
                        "updatedTime": { "type": "integer", "format": "int64" },
                        "deletedTime": { "type": "integer", "format": "int64" },
                        "email": { "type": "string" },
                        "fullName": { "type": "string" },
                        "checkIn": { "type": "string", "format": "date" },
                        "checkOut": { "type": "string", "format": "date" },
                        "status": { "type": "string", "enum": ["CONFIRMED", "DELETED"] }
                    },
                    "required": ["id", "createdTime", "updatedTime", "deletedTime", "email",
                                 "fullName", "checkIn", "checkOut", "status"]
                },
                "AvailabilityDate": {
                    "type": "object",
                    "properties": {
                        "date": { "type": "string", "format": "date" },
                        "status": { "type": "string", "enum": ["AVAILABLE", "UNAVAILABLE"] }
                    },
                    "required": ["date", "status"]
                },
                "Availability": {
                    "type": "object",
                    "properties": {
                        "from": { "type": "string", "format": "date" },
                        "to": { "type": "string", "format": "date" },
                        "dates": {
                            "type": "array",
                            "items": { "$ref": "#/components/schemas/AvailabilityDate" }
                        },
                        "count": { "type": "integer" }
                    },
                    "required": ["from", "to", "dates", "count"]
                }
            }
        }
    })
}
