//! Entry of the day
//!
//! Picks one entry per calendar day from a fixed table of indices, so every
//! installation shows the same entry on the same day as long as their
//! stores hold the same number of entries.

use chrono::{Datelike, NaiveDate, Utc};

use crate::models::Entry;

/// Per-day selection table, indexed by day of year minus one
pub const DAILY_INDICES: [usize; 365] = [
    221, 131, 311, 297, 165, 183, 38, 221, 344, 162,
    455, 296, 83, 51, 356, 369, 110, 331, 37, 318,
    383, 111, 303, 454, 11, 465, 204, 136, 134, 183,
    360, 370, 70, 38, 14, 398, 465, 311, 48, 207,
    438, 191, 233, 100, 196, 341, 145, 63, 345, 485,
    417, 202, 266, 179, 116, 175, 7, 464, 260, 67,
    377, 176, 184, 261, 310, 361, 358, 152, 181, 364,
    144, 461, 250, 408, 321, 140, 102, 207, 66, 43,
    167, 365, 106, 76, 122, 63, 453, 39, 281, 263,
    345, 239, 267, 469, 411, 348, 253, 428, 15, 230,
    400, 236, 14, 179, 134, 240, 22, 94, 451, 308,
    450, 465, 491, 386, 465, 151, 142, 328, 250, 246,
    386, 407, 392, 154, 440, 226, 94, 347, 28, 252,
    86, 103, 46, 146, 41, 107, 29, 306, 460, 55,
    338, 134, 310, 98, 206, 286, 396, 6, 480, 348,
    258, 236, 346, 231, 109, 249, 382, 375, 157, 134,
    53, 247, 175, 163, 231, 65, 448, 67, 55, 38,
    362, 296, 137, 451, 321, 67, 293, 338, 81, 153,
    158, 322, 485, 98, 378, 393, 410, 430, 472, 96,
    93, 41, 374, 127, 367, 302, 443, 321, 222, 362,
    278, 226, 96, 12, 308, 474, 404, 74, 259, 60,
    247, 279, 469, 237, 221, 162, 108, 100, 256, 249,
    59, 391, 406, 452, 206, 192, 122, 72, 170, 266,
    332, 98, 315, 52, 10, 114, 367, 2, 7, 8,
    376, 215, 189, 472, 272, 361, 146, 302, 151, 215,
    29, 98, 428, 277, 109, 357, 257, 231, 39, 91,
    412, 152, 474, 202, 472, 100, 479, 249, 23, 46,
    193, 138, 318, 211, 94, 282, 210, 141, 291, 114,
    162, 165, 326, 480, 318, 5, 382, 146, 254, 461,
    73, 106, 233, 1, 266, 353, 66, 303, 102, 186,
    431, 10, 45, 288, 336, 125, 100, 423, 272, 203,
    390, 350, 360, 70, 204, 216, 406, 460, 80, 7,
    483, 72, 436, 105, 199, 358, 384, 489, 350, 62,
    201, 361, 224, 456, 151, 483, 403, 494, 281, 187,
    261, 208, 461, 186, 74, 393, 60, 409, 287, 489,
    280, 322, 118, 432, 186, 335, 6, 195, 362, 313,
    398, 9, 282, 126, 383,
];

/// Index into a list of `len` entries for a 1-based day of year
///
/// Day 366 wraps to the first table slot. Returns `None` when `len` is 0.
pub fn daily_index(day_of_year: u32, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let slot = (day_of_year.max(1) as usize - 1) % DAILY_INDICES.len();
    Some(DAILY_INDICES[slot] % len)
}

/// Entry of the day for a given date
pub fn word_of_the_day_on(entries: &[Entry], date: NaiveDate) -> Option<&Entry> {
    daily_index(date.ordinal(), entries.len()).map(|i| &entries[i])
}

/// Entry of the day for today (UTC)
pub fn word_of_the_day(entries: &[Entry]) -> Option<&Entry> {
    word_of_the_day_on(entries, Utc::now().date_naive())
}

/// Entry of the day, or the placeholder entry when there is nothing to pick
pub fn word_of_the_day_or_placeholder(entries: &[Entry]) -> Entry {
    word_of_the_day(entries)
        .cloned()
        .unwrap_or_else(Entry::placeholder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Variant;

    fn entries(n: usize) -> Vec<Entry> {
        (0..n)
            .map(|i| {
                let word = format!("w{}", i);
                Entry::new(
                    i as i64 + 1,
                    Variant::new(&word, "", "", ""),
                    Variant::new(&word, "", "", ""),
                    Variant::new(&word, "", "", ""),
                )
            })
            .collect()
    }

    #[test]
    fn test_empty_list_has_no_entry() {
        assert_eq!(daily_index(45, 0), None);
        assert!(word_of_the_day(&[]).is_none());
    }

    #[test]
    fn test_table_lookup() {
        assert_eq!(daily_index(45, 500), Some(196));
        assert_eq!(daily_index(1, 500), Some(221));
        assert_eq!(daily_index(365, 500), Some(383));
        // 221 % 100
        assert_eq!(daily_index(1, 100), Some(21));
    }

    #[test]
    fn test_leap_day_wraps() {
        assert_eq!(daily_index(366, 500), daily_index(1, 500));
    }

    #[test]
    fn test_word_of_the_day_on_date() {
        let list = entries(500);
        let date = NaiveDate::from_ymd_opt(2024, 2, 14).unwrap();
        assert_eq!(date.ordinal(), 45);

        let entry = word_of_the_day_on(&list, date).unwrap();
        assert_eq!(entry.id, 197);
    }

    #[test]
    fn test_always_in_bounds() {
        for len in [1, 2, 7, 365, 499] {
            let list = entries(len);
            for day in 1..=366 {
                let idx = daily_index(day, len).unwrap();
                assert!(idx < list.len());
            }
        }
    }

    #[test]
    fn test_placeholder_when_empty() {
        let entry = word_of_the_day_or_placeholder(&[]);
        assert_eq!(entry, Entry::placeholder());
        assert_eq!(entry.latin.word, "zdravo");

        let list = entries(3);
        assert_ne!(word_of_the_day_or_placeholder(&list), Entry::placeholder());
    }
}
