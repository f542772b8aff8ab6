// HTTP handlers for booking endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::auth::middleware::AuthenticatedUser;
use crate::bookings::{
    BookingError, BookingListResponse, BookingStats, CancelBookingRequest, CancelBookingResponse,
    CreateBookingResponse, CreateCabBookingRequest, CreateFlightBookingRequest,
    CreateHotelBookingRequest, CreatePackageBookingRequest,
};
use crate::query::BookingListParams;

/// Handler for POST /api/bookings/flight
pub async fn create_flight_booking_handler(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateFlightBookingRequest>,
) -> Result<(StatusCode, Json<CreateBookingResponse>), BookingError> {
    let response = state
        .booking_service
        .create_flight_booking(user.user_id, request)
        .await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// Handler for POST /api/bookings/hotel
pub async fn create_hotel_booking_handler(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateHotelBookingRequest>,
) -> Result<(StatusCode, Json<CreateBookingResponse>), BookingError> {
    let response = state
        .booking_service
        .create_hotel_booking(user.user_id, request)
        .await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// Handler for POST /api/bookings/cab
pub async fn create_cab_booking_handler(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateCabBookingRequest>,
) -> Result<(StatusCode, Json<CreateBookingResponse>), BookingError> {
    let response = state
        .booking_service
        .create_cab_booking(user.user_id, request)
        .await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// Handler for POST /api/bookings/package
pub async fn create_package_booking_handler(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreatePackageBookingRequest>,
) -> Result<(StatusCode, Json<CreateBookingResponse>), BookingError> {
    let response = state
        .booking_service
        .create_package_booking(user.user_id, request)
        .await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// Handler for PUT /api/bookings/{booking_id}/cancel
pub async fn cancel_booking_handler(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Path(booking_id): Path<String>,
    Json(request): Json<CancelBookingRequest>,
) -> Result<Json<CancelBookingResponse>, BookingError> {
    let response = state
        .booking_service
        .cancel_booking(user.user_id, &booking_id, request)
        .await?;

    Ok(Json(response))
}

/// Handler for GET /api/bookings
/// Filtered, paginated listing of the authenticated user's bookings
pub async fn list_bookings_handler(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Query(params): Query<BookingListParams>,
) -> Result<Json<BookingListResponse>, BookingError> {
    let response = state
        .booking_service
        .list_bookings(user.user_id, &params)
        .await?;

    Ok(Json(response))
}

/// Handler for GET /api/bookings/{booking_id}
pub async fn get_booking_handler(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Path(booking_id): Path<String>,
) -> Result<Json<crate::bookings::Booking>, BookingError> {
    let booking = state
        .booking_service
        .get_booking(user.user_id, &booking_id)
        .await?;

    Ok(Json(booking))
}

/// Handler for GET /api/bookings/stats/summary
pub async fn booking_stats_handler(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
) -> Result<Json<BookingStats>, BookingError> {
    let stats = state.booking_service.booking_stats(user.user_id).await?;

    Ok(Json(stats))
}
