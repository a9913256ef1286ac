use crate::model::LocCount;
use log::debug;

/// Language label cloc uses for its aggregate row.
pub const SUM_LABEL: &str = "SUM";

const CODE_COLUMN: usize = 4;

/// Parses `cloc --csv` output (`files,language,blank,comment,code`).
///
/// Header and non-data rows are skipped, as are rows that are short or
/// carry a non-numeric code column. When no `SUM` row is present the
/// total is the sum of the language rows.
///
/// Blank output (nothing countable) is an empty count. `None` means the
/// output had content but neither a header nor a single data row.
pub fn parse_cloc_csv(output: &str) -> Option<LocCount> {
    let mut sum_row = None;
    let mut count = LocCount::empty();
    let mut recognized = false;
    let mut blank = true;

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        blank = false;
        if line.starts_with("files") {
            recognized = true;
            continue;
        }
        if !line.starts_with(|c: char| c.is_ascii_digit()) {
            continue;
        }
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() <= CODE_COLUMN {
            debug!("skipping short cloc row: {line}");
            continue;
        }
        let Ok(code) = fields[CODE_COLUMN].trim().parse::<u64>() else {
            debug!("skipping cloc row with bad code column: {line}");
            continue;
        };

        recognized = true;
        let language = fields[1].trim();
        if language == SUM_LABEL {
            sum_row = Some(code);
        } else {
            *count.by_language.entry(language.to_string()).or_insert(0) += code;
        }
    }

    if !blank && !recognized {
        return None;
    }
    count.total = sum_row.unwrap_or_else(|| count.by_language.values().sum());
    Some(count)
}
