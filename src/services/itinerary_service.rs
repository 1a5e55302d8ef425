use chrono::{Datelike, NaiveDate};
use mongodb::bson::oid::ObjectId;
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::models::catalog::Catalog;
use crate::models::predefined::PredefinedTourQuote;
use crate::models::quote::{DayDraft, GuideLine, HotelCost, QuoteDraft, ServiceLine};

/// A single edit of the day list, as posted to `/api/drafts/days`.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DayEdit {
    InsertBelow { index: usize },
    Copy { index: usize },
    Move { from: usize, to: usize },
    Remove { index: usize },
}

fn following(date: NaiveDate) -> ApiResult<NaiveDate> {
    date.succ_opt()
        .ok_or_else(|| ApiError::bad_request(format!("No date follows {}.", date)))
}

fn next_date(day: Option<&DayDraft>, today: NaiveDate) -> ApiResult<NaiveDate> {
    following(day.and_then(|d| d.date).unwrap_or(today))
}

fn check_index(days: &[DayDraft], index: usize) -> ApiResult<()> {
    if index >= days.len() {
        return Err(ApiError::bad_request(format!(
            "Day {} does not exist.",
            index + 1
        )));
    }
    Ok(())
}

fn display_date(date: NaiveDate) -> String {
    date.format("%d-%b-%y").to_string()
}

pub struct ItineraryService;

impl ItineraryService {
    pub fn apply_edit(days: &mut Vec<DayDraft>, edit: &DayEdit, today: NaiveDate) -> ApiResult<()> {
        match *edit {
            DayEdit::InsertBelow { index } => Self::insert_day_below(days, index, today),
            DayEdit::Copy { index } => Self::copy_day(days, index, today),
            DayEdit::Move { from, to } => Self::move_day(days, from, to),
            DayEdit::Remove { index } => Self::remove_day(days, index),
        }
    }

    /// Inserts an empty day after `index`, dated the day after it (tomorrow
    /// when it has no date). Dated days further down are re-dated so the
    /// itinerary stays consecutive. On an empty list the day is appended.
    pub fn insert_day_below(days: &mut Vec<DayDraft>, index: usize, today: NaiveDate) -> ApiResult<()> {
        if days.is_empty() {
            days.push(DayDraft {
                date: Some(next_date(None, today)?),
                ..Default::default()
            });
            return Ok(());
        }
        check_index(days, index)?;

        let mut current = next_date(days.get(index), today)?;
        days.insert(
            index + 1,
            DayDraft {
                date: Some(current),
                ..Default::default()
            },
        );

        // Undated days keep their place without a date.
        for day in days.iter_mut().skip(index + 2) {
            if day.date.is_some() {
                current = following(current)?;
                day.date = Some(current);
            }
        }
        Ok(())
    }

    /// Inserts a copy of the day's city and hotel after it, without
    /// services, dated the following day.
    pub fn copy_day(days: &mut Vec<DayDraft>, index: usize, today: NaiveDate) -> ApiResult<()> {
        check_index(days, index)?;

        let original = &days[index];
        let copy = DayDraft {
            date: Some(next_date(Some(original), today)?),
            city: original.city.clone(),
            hotel: original.hotel.clone(),
            services: Vec::new(),
            guide_services: Vec::new(),
        };
        days.insert(index + 1, copy);
        Ok(())
    }

    /// Moves a day with its date; dates are not rewritten.
    pub fn move_day(days: &mut Vec<DayDraft>, from: usize, to: usize) -> ApiResult<()> {
        check_index(days, from)?;
        check_index(days, to)?;
        if from != to {
            let day = days.remove(from);
            days.insert(to, day);
        }
        Ok(())
    }

    pub fn remove_day(days: &mut Vec<DayDraft>, index: usize) -> ApiResult<()> {
        check_index(days, index)?;
        days.remove(index);
        Ok(())
    }

    /// One hotel cost line per hotel, in order of first appearance, with a
    /// night per day spent there. Undated days and unknown hotels are
    /// skipped. Prices start at zero for staff to fill in.
    pub fn hotel_costs_from_days(days: &[DayDraft], catalog: &Catalog) -> Vec<HotelCost> {
        let mut stays: Vec<(ObjectId, u32, NaiveDate, NaiveDate)> = Vec::new();

        for day in days {
            let Some(date) = day.date else { continue };
            let Some(hotel_id) = day
                .hotel
                .as_deref()
                .and_then(|h| ObjectId::parse_str(h.trim()).ok())
            else {
                continue;
            };
            if catalog.hotel(&hotel_id).is_none() {
                continue;
            }

            match stays.iter_mut().find(|(id, ..)| *id == hotel_id) {
                Some((_, nights, first, last)) => {
                    *nights += 1;
                    *first = (*first).min(date);
                    *last = (*last).max(date);
                }
                None => stays.push((hotel_id, 1, date, date)),
            }
        }

        stays
            .into_iter()
            .filter_map(|(hotel_id, nights, first, last)| {
                let hotel = catalog.hotel(&hotel_id)?;
                Some(HotelCost {
                    date: Self::stay_range_display(first, last),
                    name: hotel.name.clone(),
                    rooms: 1,
                    nights,
                    ..Default::default()
                })
            })
            .collect()
    }

    /// `01-Mar-26 to 04-Apr-26`, compacted to `01-04-Mar-26` within one
    /// month and to `01-Mar-26` for a single date.
    pub fn stay_range_display(start: NaiveDate, end: NaiveDate) -> String {
        if start == end {
            display_date(start)
        } else if start.year() == end.year() && start.month() == end.month() {
            format!("{}-{}", start.format("%d"), display_date(end))
        } else {
            format!("{} to {}", display_date(start), display_date(end))
        }
    }

    /// Appends a template's days to the draft. Days without a date are
    /// dropped first; template days are dated consecutively after the last
    /// remaining day, or from tomorrow. Services are taken in template order
    /// and priced for `tour_pack_type_id`; services no longer offered in the
    /// day's city and unknown guide services are left out.
    pub fn apply_predefined(
        draft: &mut QuoteDraft,
        template: &PredefinedTourQuote,
        catalog: &Catalog,
        tour_pack_type_id: &ObjectId,
        today: NaiveDate,
    ) -> ApiResult<()> {
        draft.days.retain(|d| d.date.is_some());
        if draft.tour_pack_type.is_none() {
            draft.tour_pack_type = Some(tour_pack_type_id.to_hex());
        }

        let mut current = draft.days.last().and_then(|d| d.date).unwrap_or(today);

        for template_day in template.ordered_days() {
            current = following(current)?;

            let mut ordered = template_day.services.clone();
            ordered.sort_by_key(|s| s.order);

            let services = ordered
                .iter()
                .filter(|s| catalog.service_offered_in(&s.service_id, &template_day.city_id))
                .map(|s| ServiceLine {
                    service: s.service_id.to_hex(),
                    price_at_booking: catalog.price_for(
                        &s.service_id,
                        Some(tour_pack_type_id),
                        Some(&template_day.city_id),
                    ),
                    quantity: Some(s.quantity.max(1)),
                })
                .collect();

            let guide_services = template_day
                .guide_service_ids
                .iter()
                .filter_map(|id| {
                    catalog.guide_price(id).map(|price| GuideLine {
                        guide_service: id.to_hex(),
                        price_at_booking: Some(price),
                    })
                })
                .collect();

            draft.days.push(DayDraft {
                date: Some(current),
                city: Some(template_day.city_id.to_hex()),
                hotel: Some(template_day.hotel_id.to_hex()),
                services,
                guide_services,
            });
        }
        Ok(())
    }
}
