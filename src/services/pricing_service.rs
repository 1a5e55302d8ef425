use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{ApiError, ApiResult};
use crate::models::quote::{HotelCost, PriceAdjustment, QuoteDraft, QuoteTotals, TourDay};

const MONEY_DECIMAL_PLACES: u32 = 2;

/// Everything the totals depend on, borrowed from a stored quote or a draft.
pub struct PricingInput<'a> {
    pub hotel_costs: &'a [HotelCost],
    pub discounts: &'a [PriceAdjustment],
    pub extra_costs: &'a [PriceAdjustment],
    pub commission_rate_hotel: Decimal,
    pub commission_rate_services: Decimal,
}

fn too_large(field: impl Into<String>) -> ApiError {
    ApiError::invalid(field, "Amount is too large.")
}

fn checked_sum(
    mut values: impl Iterator<Item = Option<Decimal>>,
    field: &str,
) -> ApiResult<Decimal> {
    values.try_fold(Decimal::ZERO, |total, value| {
        value
            .and_then(|v| total.checked_add(v))
            .ok_or_else(|| too_large(field))
    })
}

pub struct PricingService;

impl PricingService {
    pub fn round_money(value: Decimal) -> Decimal {
        value.round_dp_with_strategy(MONEY_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Sum of price-at-booking × quantity over every day's services. A zero
    /// quantity counts as one.
    pub fn calculate_service_cost(days: &[TourDay]) -> ApiResult<Decimal> {
        Self::sum_service_lines(
            days.iter()
                .flat_map(|d| d.services.iter())
                .map(|s| (s.price_at_booking, s.quantity)),
        )
    }

    pub fn calculate_guide_service_cost(days: &[TourDay]) -> ApiResult<Decimal> {
        checked_sum(
            days.iter()
                .flat_map(|d| d.guide_services.iter())
                .map(|g| Some(g.price_at_booking)),
            "guide_services",
        )
    }

    /// Room price × rooms × nights plus extra-bed price × nights for one
    /// line; `None` when the amount does not fit.
    pub fn hotel_line_cost(cost: &HotelCost) -> Option<Decimal> {
        let nights = Decimal::from(cost.nights);
        let room_cost = Decimal::from(cost.rooms)
            .checked_mul(nights)?
            .checked_mul(cost.price)?;
        let extra_bed_cost = nights.checked_mul(cost.extra_bed_price)?;
        room_cost.checked_add(extra_bed_cost)
    }

    /// Sum of every hotel line. An overflowing line is reported against its
    /// 1-based position, e.g. `hotel_cost2`.
    pub fn calculate_hotel_cost(hotel_costs: &[HotelCost]) -> ApiResult<Decimal> {
        hotel_costs
            .iter()
            .enumerate()
            .try_fold(Decimal::ZERO, |total, (i, cost)| {
                Self::hotel_line_cost(cost)
                    .and_then(|line| total.checked_add(line))
                    .ok_or_else(|| too_large(format!("hotel_cost{}", i + 1)))
            })
    }

    pub fn total_room_nights(hotel_costs: &[HotelCost]) -> ApiResult<u32> {
        hotel_costs
            .iter()
            .enumerate()
            .try_fold(0u32, |total, (i, cost)| {
                cost.rooms
                    .checked_mul(cost.nights)
                    .and_then(|n| total.checked_add(n))
                    .ok_or_else(|| {
                        ApiError::invalid(format!("hotel_cost{}", i + 1), "Too many room nights.")
                    })
            })
    }

    pub fn sum_adjustments(adjustments: &[PriceAdjustment], field: &str) -> ApiResult<Decimal> {
        checked_sum(adjustments.iter().map(|a| Some(a.amount)), field)
    }

    /// Totals of a stored itinerary.
    pub fn calculate_totals(days: &[TourDay], input: PricingInput<'_>) -> ApiResult<QuoteTotals> {
        let service_total = Self::calculate_service_cost(days)?;
        let guide_service_total = Self::calculate_guide_service_cost(days)?;
        Self::finish(service_total, guide_service_total, input)
    }

    /// Totals of a draft as the form shows them; missing prices count as zero.
    pub fn calculate_draft_totals(draft: &QuoteDraft) -> ApiResult<QuoteTotals> {
        let service_total = Self::sum_service_lines(
            draft
                .days
                .iter()
                .flat_map(|d| d.services.iter())
                .map(|s| (s.price_at_booking.unwrap_or_default(), s.quantity.unwrap_or(1))),
        )?;
        let guide_service_total = checked_sum(
            draft
                .days
                .iter()
                .flat_map(|d| d.guide_services.iter())
                .map(|g| Some(g.price_at_booking.unwrap_or_default())),
            "guide_services",
        )?;

        Self::finish(
            service_total,
            guide_service_total,
            PricingInput {
                hotel_costs: &draft.hotel_costs,
                discounts: &draft.discounts,
                extra_costs: &draft.extra_costs,
                commission_rate_hotel: draft.commission_rate_hotel,
                commission_rate_services: draft.commission_rate_services,
            },
        )
    }

    fn sum_service_lines(lines: impl Iterator<Item = (Decimal, u32)>) -> ApiResult<Decimal> {
        checked_sum(
            lines.map(|(price, quantity)| price.checked_mul(Decimal::from(quantity.max(1)))),
            "services",
        )
    }

    // Components are rounded first and the grand total is built from the
    // rounded values, so the reported fields always add up.
    fn finish(
        service_total: Decimal,
        guide_service_total: Decimal,
        input: PricingInput<'_>,
    ) -> ApiResult<QuoteTotals> {
        let service_total = Self::round_money(service_total);
        let guide_service_total = Self::round_money(guide_service_total);
        let service_grand_total = service_total
            .checked_add(guide_service_total)
            .ok_or_else(|| too_large("services"))?;
        let hotel_grand_total = Self::round_money(Self::calculate_hotel_cost(input.hotel_costs)?);
        let extra_costs_total =
            Self::round_money(Self::sum_adjustments(input.extra_costs, "extra_costs")?);
        let discounts_total =
            Self::round_money(Self::sum_adjustments(input.discounts, "discounts")?);
        let total_room_nights = Self::total_room_nights(input.hotel_costs)?;

        // Hotel commission is a flat amount per room-night, service
        // commission a percentage. Neither is part of the grand total.
        let commission_amount_hotel = input
            .commission_rate_hotel
            .checked_mul(Decimal::from(total_room_nights))
            .ok_or_else(|| too_large("commission_rate_hotel"))?;
        let commission_amount_services = input
            .commission_rate_services
            .checked_mul(service_grand_total)
            .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
            .ok_or_else(|| too_large("commission_rate_services"))?;

        let grand_total_cost = service_grand_total
            .checked_add(hotel_grand_total)
            .and_then(|v| v.checked_add(extra_costs_total))
            .and_then(|v| v.checked_sub(discounts_total))
            .ok_or_else(|| too_large("grand_total_cost"))?;

        Ok(QuoteTotals {
            service_total,
            guide_service_total,
            service_grand_total,
            hotel_grand_total,
            extra_costs_total,
            discounts_total,
            total_room_nights,
            commission_amount_hotel: Self::round_money(commission_amount_hotel),
            commission_amount_services: Self::round_money(commission_amount_services),
            grand_total_cost,
        })
    }
}
