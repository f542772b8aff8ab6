use chrono::Utc;
use validator::Validate;

use crate::bookings::booking_id::generate_booking_id;
use crate::bookings::cancellation::CancellationPolicy;
use crate::bookings::error::BookingError;
use crate::bookings::models::{
    Booking, BookingDetails, BookingListResponse, BookingStats, BookingStatus, BookingType,
    CancelBookingRequest, CancelBookingResponse, Cancellation, CancelledBy, CreateBookingResponse,
    CreateCabBookingRequest, CreateFlightBookingRequest, CreateHotelBookingRequest,
    CreatePackageBookingRequest, DropoffPoint, Pagination, PickupPoint, RefundStatus,
};
use crate::bookings::pricing::PricingCalculator;
use crate::bookings::repository::{
    BookingsRepository, CatalogRepository, InventoryClaim, NewBooking,
};
use crate::bookings::status_machine::StatusMachine;
use crate::query::{BookingListParams, BookingQueryBuilder};
use rust_decimal::Decimal;

/// Service for booking business logic
#[derive(Clone)]
pub struct BookingService {
    bookings_repo: BookingsRepository,
    catalog_repo: CatalogRepository,
}

impl BookingService {
    pub fn new(bookings_repo: BookingsRepository, catalog_repo: CatalogRepository) -> Self {
        Self {
            bookings_repo,
            catalog_repo,
        }
    }

    /// Book a flight for the authenticated user.
    ///
    /// Seats are claimed with a conditional decrement in the same
    /// transaction as the insert, so concurrent requests for the last
    /// seats cannot both succeed.
    pub async fn create_flight_booking(
        &self,
        user_id: i32,
        request: CreateFlightBookingRequest,
    ) -> Result<CreateBookingResponse, BookingError> {
        validate(&request)?;
        for passenger in &request.passengers {
            validate(passenger)?;
        }

        let flight = self
            .catalog_repo
            .find_flight(request.flight_id)
            .await?
            .ok_or(BookingError::ProductNotFound("Flight"))?;

        let pricing = PricingCalculator::flight(&flight.quote(), request.passengers.len())?;
        let booking_id = generate_booking_id(BookingType::Flight);
        let seats = request.passengers.len() as i32;

        let details = BookingDetails::Flight {
            flight_id: flight.id,
            passengers: request.passengers.into_iter().map(Into::into).collect(),
            seats: request.seats,
            baggage: request.baggage.unwrap_or_default(),
        };

        let booking = self
            .bookings_repo
            .create(
                NewBooking {
                    booking_id: booking_id.clone(),
                    user_id,
                    booking_type: BookingType::Flight,
                    product_name: flight.display_name(),
                    details,
                    pricing,
                    notes: request.special_requests,
                },
                InventoryClaim::FlightSeats {
                    flight_id: flight.id,
                    seats,
                },
            )
            .await?;

        tracing::info!(booking_id = %booking_id, user_id, "flight booking created");

        Ok(CreateBookingResponse {
            booking_id,
            booking,
        })
    }

    /// Book a hotel stay. Priced per room-night.
    pub async fn create_hotel_booking(
        &self,
        user_id: i32,
        request: CreateHotelBookingRequest,
    ) -> Result<CreateBookingResponse, BookingError> {
        validate(&request)?;
        if request.guests.adults < 1 {
            return Err(BookingError::ValidationError(
                "At least one adult guest is required".to_string(),
            ));
        }

        let nights = (request.check_out - request.check_in).num_days();
        if nights <= 0 {
            return Err(BookingError::ValidationError(
                "Check-out must be after check-in".to_string(),
            ));
        }

        let offer = self
            .catalog_repo
            .find_room_offer(request.hotel_id, &request.room_type)
            .await?
            .ok_or(BookingError::ProductNotFound("Hotel room"))?;

        let pricing = PricingCalculator::hotel(&offer.quote(), request.rooms, nights)?;
        let booking_id = generate_booking_id(BookingType::Hotel);

        let details = BookingDetails::Hotel {
            hotel_id: offer.hotel_id,
            room_type: offer.room_type.clone(),
            rooms: request.rooms,
            guests: request.guests,
            check_in: request.check_in,
            check_out: request.check_out,
            special_requests: request.special_requests,
        };

        let booking = self
            .bookings_repo
            .create(
                NewBooking {
                    booking_id: booking_id.clone(),
                    user_id,
                    booking_type: BookingType::Hotel,
                    product_name: offer.hotel_name.clone(),
                    details,
                    pricing,
                    notes: None,
                },
                InventoryClaim::None,
            )
            .await?;

        tracing::info!(booking_id = %booking_id, user_id, "hotel booking created");

        Ok(CreateBookingResponse {
            booking_id,
            booking,
        })
    }

    /// Book a cab ride. The fare is metered from the haversine distance
    /// between pickup and dropoff; an open-ended trip (no dropoff) is
    /// charged the surge-adjusted base rate.
    pub async fn create_cab_booking(
        &self,
        user_id: i32,
        request: CreateCabBookingRequest,
    ) -> Result<CreateBookingResponse, BookingError> {
        validate(&request)?;
        validate(&request.pickup)?;
        if let Some(dropoff) = &request.dropoff {
            validate(dropoff)?;
        }

        let cab = self
            .catalog_repo
            .find_cab(request.cab_id)
            .await?
            .ok_or(BookingError::ProductNotFound("Cab"))?;

        let pickup_coords = request.pickup.coordinates();
        let dropoff_coords = request.dropoff.as_ref().map(|d| d.coordinates());

        let pricing = PricingCalculator::cab(
            cab.base_rate,
            cab.per_km_rate,
            cab.surge_multiplier,
            &pickup_coords,
            dropoff_coords.as_ref(),
            &cab.currency,
        );
        let booking_id = generate_booking_id(BookingType::Cab);

        let details = BookingDetails::Cab {
            cab_id: cab.id,
            pickup: PickupPoint {
                address: request.pickup.address,
                coordinates: pickup_coords,
                datetime: request.pickup_datetime,
            },
            dropoff: request.dropoff.map(|d| DropoffPoint {
                coordinates: d.coordinates(),
                address: d.address,
            }),
            passengers: request.passengers,
            luggage: request.luggage,
            special_requests: request.special_requests,
        };

        let booking = self
            .bookings_repo
            .create(
                NewBooking {
                    booking_id: booking_id.clone(),
                    user_id,
                    booking_type: BookingType::Cab,
                    product_name: cab.display_name(),
                    details,
                    pricing,
                    notes: None,
                },
                InventoryClaim::CabVehicle { cab_id: cab.id },
            )
            .await?;

        tracing::info!(booking_id = %booking_id, user_id, "cab booking created");

        Ok(CreateBookingResponse {
            booking_id,
            booking,
        })
    }

    /// Book a tour package. Travelers are priced by category; the group
    /// discount applies when the party size reaches the package minimum.
    pub async fn create_package_booking(
        &self,
        user_id: i32,
        request: CreatePackageBookingRequest,
    ) -> Result<CreateBookingResponse, BookingError> {
        validate(&request)?;
        for traveler in &request.travelers {
            validate(traveler)?;
        }
        if let Some(return_date) = request.return_date {
            if return_date <= request.departure_date {
                return Err(BookingError::ValidationError(
                    "Return date must be after departure date".to_string(),
                ));
            }
        }

        let package = self
            .catalog_repo
            .find_package(request.package_id)
            .await?
            .ok_or(BookingError::ProductNotFound("Package"))?;

        let traveler_types: Vec<_> = request.travelers.iter().map(|t| t.traveler_type).collect();
        let pricing = PricingCalculator::package(&package.rates(), &traveler_types)?;
        let booking_id = generate_booking_id(BookingType::Package);

        let details = BookingDetails::Package {
            package_id: package.id,
            travelers: request.travelers.into_iter().map(Into::into).collect(),
            departure_date: request.departure_date,
            return_date: request.return_date,
            special_requests: request.special_requests,
        };

        let booking = self
            .bookings_repo
            .create(
                NewBooking {
                    booking_id: booking_id.clone(),
                    user_id,
                    booking_type: BookingType::Package,
                    product_name: package.name.clone(),
                    details,
                    pricing,
                    notes: None,
                },
                InventoryClaim::None,
            )
            .await?;

        tracing::info!(booking_id = %booking_id, user_id, "package booking created");

        Ok(CreateBookingResponse {
            booking_id,
            booking,
        })
    }

    /// Cancel a booking on behalf of its owner.
    ///
    /// The refund is computed once from the policy tier in force at
    /// cancellation time and stored on the row; it is never recomputed.
    pub async fn cancel_booking(
        &self,
        user_id: i32,
        booking_id: &str,
        request: CancelBookingRequest,
    ) -> Result<CancelBookingResponse, BookingError> {
        let booking = self
            .bookings_repo
            .find_for_user(user_id, booking_id)
            .await?
            .ok_or(BookingError::NotFound)?;

        match booking.status {
            BookingStatus::Cancelled | BookingStatus::Refunded => {
                return Err(BookingError::AlreadyCancelled);
            }
            BookingStatus::Completed => {
                return Err(BookingError::InvalidState(
                    "Completed bookings cannot be cancelled".to_string(),
                ));
            }
            BookingStatus::Pending | BookingStatus::Confirmed => {}
        }

        // Guards above give the specific errors; the machine stays the
        // single authority on which edges exist.
        StatusMachine::transition(booking.status, BookingStatus::Cancelled)
            .map_err(BookingError::InvalidTransition)?;

        let now = Utc::now();
        let refund = CancellationPolicy::compute_refund(
            booking.booking_type,
            booking.created_at,
            now,
            booking.pricing.total,
        );

        // A zero refund has nothing left to process.
        let refund_status = if refund.amount > Decimal::ZERO {
            RefundStatus::Pending
        } else {
            RefundStatus::Completed
        };

        let cancellation = Cancellation {
            cancelled_at: now,
            cancelled_by: CancelledBy::User,
            refund_amount: refund.amount,
            refund_status,
            refund_reason: request.reason,
            refund_id: None,
        };

        let Some(cancelled) = self
            .bookings_repo
            .mark_cancelled(booking.id, &cancellation)
            .await?
        else {
            // Lost a race; report the state that actually won.
            let current = self
                .bookings_repo
                .find_for_user(user_id, booking_id)
                .await?
                .ok_or(BookingError::NotFound)?;
            return match current.status {
                BookingStatus::Cancelled | BookingStatus::Refunded => {
                    Err(BookingError::AlreadyCancelled)
                }
                other => Err(BookingError::InvalidState(format!(
                    "Booking is {}, cannot cancel",
                    other.as_str()
                ))),
            };
        };

        tracing::info!(
            booking_id = %booking_id,
            user_id,
            refund_amount = %refund.amount,
            "booking cancelled"
        );

        Ok(CancelBookingResponse {
            booking: cancelled,
            refund_amount: refund.amount,
        })
    }

    /// Batch transition for bookings whose service date has passed.
    /// Only confirmed bookings complete; anything else is left alone.
    pub async fn complete_booking(
        &self,
        user_id: i32,
        booking_id: &str,
    ) -> Result<Booking, BookingError> {
        let booking = self
            .bookings_repo
            .find_for_user(user_id, booking_id)
            .await?
            .ok_or(BookingError::NotFound)?;

        if booking.status == BookingStatus::Completed {
            return Ok(booking);
        }
        StatusMachine::transition(booking.status, BookingStatus::Completed)
            .map_err(BookingError::InvalidTransition)?;

        self.bookings_repo
            .mark_completed(booking.id)
            .await?
            .ok_or_else(|| {
                BookingError::InvalidTransition(format!(
                    "{} -> completed",
                    booking.status.as_str()
                ))
            })
    }

    /// Fetch a single booking, scoped to the owner.
    pub async fn get_booking(
        &self,
        user_id: i32,
        booking_id: &str,
    ) -> Result<Booking, BookingError> {
        self.bookings_repo
            .find_for_user(user_id, booking_id)
            .await?
            .ok_or(BookingError::NotFound)
    }

    /// Filtered, paginated listing of the user's bookings.
    pub async fn list_bookings(
        &self,
        user_id: i32,
        params: &BookingListParams,
    ) -> Result<BookingListResponse, BookingError> {
        let mut builder = BookingQueryBuilder::new();
        if let Some(booking_type) = params.booking_type {
            builder.add_type_filter(booking_type);
        }
        if let Some(status) = params.status {
            builder.add_status_filter(status);
        }
        if let Some(term) = params.search_term() {
            builder.add_search_filter(term);
        }
        builder.set_pagination(params.page(), params.limit());

        let (bookings, total) = self.bookings_repo.list(user_id, &builder).await?;

        Ok(BookingListResponse {
            bookings,
            pagination: Pagination::new(params.page(), params.limit(), total),
        })
    }

    /// Aggregate statistics over the user's bookings.
    pub async fn booking_stats(&self, user_id: i32) -> Result<BookingStats, BookingError> {
        self.bookings_repo.summary_stats(user_id).await
    }
}

fn validate<T: Validate>(value: &T) -> Result<(), BookingError> {
    value
        .validate()
        .map_err(|e| BookingError::ValidationError(e.to_string()))
}
