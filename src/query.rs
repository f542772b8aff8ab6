use serde::Deserialize;

use crate::bookings::{BookingStatus, BookingType};

pub const BOOKING_COLUMNS: &str = "id, booking_id, user_id, booking_type, status, product_name, \
     details, base_price, taxes, fees, discounts, total, currency, \
     payment_method, payment_status, transaction_id, payment_intent_id, paid_at, \
     is_cancelled, cancelled_at, cancelled_by, refund_amount, refund_status, \
     refund_reason, refund_id, notes, created_at, updated_at";

/// SQL query builder for the booking listing.
/// Builds a parameterized query with optional filters and pagination;
/// `$1` is always the owning user id, text filter params follow.
pub struct BookingQueryBuilder {
    where_clauses: Vec<String>,
    params: Vec<String>,
    limit: u32,
    offset: u64,
}

impl BookingQueryBuilder {
    pub fn new() -> Self {
        Self {
            where_clauses: Vec::new(),
            params: Vec::new(),
            limit: 10,
            offset: 0,
        }
    }

    /// Exact-match filter on booking type.
    pub fn add_type_filter(&mut self, booking_type: BookingType) {
        let param_index = self.params.len() + 2;
        self.where_clauses
            .push(format!("booking_type = ${}", param_index));
        self.params.push(booking_type.as_str().to_string());
    }

    /// Exact-match filter on booking status.
    pub fn add_status_filter(&mut self, status: BookingStatus) {
        let param_index = self.params.len() + 2;
        self.where_clauses.push(format!("status = ${}", param_index));
        self.params.push(status.as_str().to_string());
    }

    /// Case-insensitive substring match on the denormalized product name.
    pub fn add_search_filter(&mut self, search: &str) {
        let param_index = self.params.len() + 2;
        self.where_clauses
            .push(format!("product_name ILIKE ${}", param_index));
        self.params.push(format!("%{}%", search));
    }

    /// 1-indexed pagination. The offset is computed in u64 so an
    /// arbitrarily large page number cannot overflow.
    pub fn set_pagination(&mut self, page: u32, limit: u32) {
        self.limit = limit;
        self.offset = u64::from(page.saturating_sub(1)) * u64::from(limit);
    }

    fn where_sql(&self) -> String {
        let mut sql = "WHERE user_id = $1".to_string();
        for clause in &self.where_clauses {
            sql.push_str(" AND ");
            sql.push_str(clause);
        }
        sql
    }

    /// The page query, newest bookings first.
    /// Returns `(query_string, text_params)`; the caller binds the user id
    /// first, then the text params in order.
    pub fn build(&self) -> (String, Vec<String>) {
        let query = format!(
            "SELECT {} FROM bookings {} ORDER BY created_at DESC LIMIT {} OFFSET {}",
            BOOKING_COLUMNS,
            self.where_sql(),
            self.limit,
            self.offset
        );
        (query, self.params.clone())
    }

    /// The matching-rows count query with the same filters.
    pub fn build_count(&self) -> (String, Vec<String>) {
        let query = format!("SELECT COUNT(*) FROM bookings {}", self.where_sql());
        (query, self.params.clone())
    }
}

impl Default for BookingQueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Query parameters accepted by the booking listing endpoint.
#[derive(Debug, Deserialize)]
pub struct BookingListParams {
    /// Filter by booking type (exact match)
    #[serde(rename = "type")]
    pub booking_type: Option<BookingType>,
    /// Filter by booking status (exact match)
    pub status: Option<BookingStatus>,
    /// Substring search over the booked product name
    pub search: Option<String>,
    /// Page number (1-indexed, defaults to 1)
    pub page: Option<u32>,
    /// Items per page (defaults to 10, capped at 100)
    pub limit: Option<u32>,
}

impl BookingListParams {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(10).clamp(1, 100)
    }

    /// Trimmed search term, None when empty.
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}
