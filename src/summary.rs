use serde::Serialize;

use crate::filter::FilteredView;

/// Text shown in place of a metric when the filtered view is empty
pub const NO_DATA: &str = "no data";

/// Average price and rating of a filtered view
///
/// Both averages are `None` for an empty view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Summary {
    pub avg_price: Option<f64>,
    pub avg_rating: Option<f64>,
}

impl Summary {
    pub fn price_label(&self) -> String {
        match self.avg_price {
            Some(price) => format!("₹ {:.2}", price),
            None => NO_DATA.to_string(),
        }
    }

    pub fn rating_label(&self) -> String {
        match self.avg_rating {
            Some(rating) => format!("{:.2} ⭐", rating),
            None => NO_DATA.to_string(),
        }
    }
}

pub fn summarize(view: &FilteredView) -> Summary {
    Summary {
        avg_price: mean(view.iter().map(|p| p.price)),
        avg_rating: mean(view.iter().map(|p| p.rating)),
    }
}

pub(crate) fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}
