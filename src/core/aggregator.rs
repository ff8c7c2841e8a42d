use crate::domain::model::TeacherListing;
use crate::utils::error::{EtlError, Result};

/// 計算子類別的平均時薪，回傳 (四捨五入到分的平均, 參與計算的列表數)
///
/// 每個列表只取第一個名稱相符的項目；無效或負數的價格不計入。
/// 沒有任何參與列表時平均為 0。總和溢位為非有限值時回傳錯誤，該子類別不回報。
pub fn aggregate(listings: &[TeacherListing], subcategory_name: &str) -> Result<(f64, usize)> {
    let (sum, count) = listings
        .iter()
        .filter_map(|listing| listing.find_category(subcategory_name))
        .filter_map(|entry| entry.price())
        .fold((0.0_f64, 0_usize), |(sum, count), price| (sum + price, count + 1));

    if count == 0 {
        return Ok((0.0, 0));
    }

    let average = round_to_cents(sum / count as f64);
    if !average.is_finite() {
        return Err(EtlError::ProcessingError {
            message: format!(
                "Average price for '{}' is not finite ({} listing(s))",
                subcategory_name, count
            ),
        });
    }

    Ok((average, count))
}

/// 乘以 100、取最接近整數（同距時遠離零）、再除以 100
pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
