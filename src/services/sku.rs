use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::entities::{
    component_code::{self, Entity as ComponentCode},
    make_code::{self, Entity as MakeCode},
    model_code::{self, Entity as ModelCode},
    part::{self, Entity as Part},
    system_code::{self, Entity as SystemCode},
};
use crate::errors::ServiceError;

/// Long-form names for position suffixes. Unknown codes pass through
/// verbatim rather than failing, since SKUs in the wild may carry
/// positions issued before this table existed.
static POSITION_CODES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("LF", "Left Front"),
        ("RF", "Right Front"),
        ("LR", "Left Rear"),
        ("RR", "Right Rear"),
        ("L", "Left"),
        ("R", "Right"),
        ("F", "Front"),
        ("RE", "Rear"),
    ])
});

#[derive(Debug, Clone, Deserialize)]
pub struct SkuInput {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub system_code: String,
    pub component_code: String,
    pub position: Option<String>,
}

/// Human-readable expansion of an encoded SKU.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decoded {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub system: String,
    pub component: String,
    pub position: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkuResult {
    pub sku: String,
    pub decoded: Decoded,
}

struct ParsedSku<'a> {
    make_code: &'a str,
    model_code: &'a str,
    year_code: &'a str,
    system_code: &'a str,
    component_code: &'a str,
    position_code: Option<&'a str>,
}

/// Deterministic encoder/decoder between SKU strings and their decoded
/// (make, model, year, system, component, position) tuples. Encoding
/// lazily issues model codes and disambiguates duplicate base SKUs with
/// a 3-digit sequence suffix; decoding is lenient about retired codes.
#[derive(Clone)]
pub struct SkuService {
    db: Arc<DatabaseConnection>,
}

impl SkuService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Encodes the tuple into `{make}-{model}-{yy}-{sys}{comp}[-{pos}]`,
    /// appending `-NNN` when the base SKU is already taken.
    #[instrument(skip(self))]
    pub async fn encode(&self, input: SkuInput) -> Result<SkuResult, ServiceError> {
        let make_entry = MakeCode::find()
            .filter(make_code::Column::Make.eq(&input.make))
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::ValidationError(format!("Unknown make: {}", input.make))
            })?;

        let model_entry = match ModelCode::find()
            .filter(model_code::Column::Make.eq(&input.make))
            .filter(model_code::Column::Model.eq(&input.model))
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)?
        {
            Some(entry) => entry,
            None => {
                let code = self.generate_model_code(&input.make, &input.model).await?;
                info!(make = %input.make, model = %input.model, code = %code, "issued model code");
                model_code::ActiveModel {
                    make: Set(input.make.clone()),
                    model: Set(input.model.clone()),
                    code: Set(code),
                    ..Default::default()
                }
                .insert(&*self.db)
                .await
                .map_err(ServiceError::db_error)?
            }
        };

        let system_entry = SystemCode::find()
            .filter(system_code::Column::Code.eq(&input.system_code))
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "Unknown system code: {}",
                    input.system_code
                ))
            })?;

        let component_entry = ComponentCode::find()
            .filter(component_code::Column::SystemCode.eq(&input.system_code))
            .filter(component_code::Column::Code.eq(&input.component_code))
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "Unknown component code: {} in system {}",
                    input.component_code, input.system_code
                ))
            })?;

        let year_code = format!("{:02}", input.year.rem_euclid(100));
        let mut base_sku = format!(
            "{}-{}-{}-{}{}",
            make_entry.code, model_entry.code, year_code, input.system_code, input.component_code
        );
        if let Some(position) = &input.position {
            base_sku.push('-');
            base_sku.push_str(position);
        }

        let sku = self.with_sequence_suffix(base_sku).await?;

        let position = input
            .position
            .as_deref()
            .map(|p| POSITION_CODES.get(p).map(|s| s.to_string()).unwrap_or_else(|| p.to_string()));

        Ok(SkuResult {
            sku,
            decoded: Decoded {
                make: input.make,
                model: input.model,
                year: input.year,
                system: system_entry.name,
                component: component_entry.name,
                position,
            },
        })
    }

    /// Decodes a SKU string, tolerating retired or foreign codes: a
    /// missing model/system/component resolves to an `Unknown (code)`
    /// placeholder instead of failing. Only a malformed shape or an
    /// unknown make yields `None`.
    #[instrument(skip(self))]
    pub async fn decode(&self, sku: &str) -> Result<Option<Decoded>, ServiceError> {
        let parsed = match parse_sku(sku) {
            Some(parsed) => parsed,
            None => return Ok(None),
        };

        let make_entry = match MakeCode::find()
            .filter(make_code::Column::Code.eq(parsed.make_code))
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)?
        {
            Some(entry) => entry,
            None => return Ok(None),
        };

        let model_entry = ModelCode::find()
            .filter(model_code::Column::Make.eq(&make_entry.make))
            .filter(model_code::Column::Code.eq(parsed.model_code))
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;

        let system_entry = SystemCode::find()
            .filter(system_code::Column::Code.eq(parsed.system_code))
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;

        let component_entry = ComponentCode::find()
            .filter(component_code::Column::SystemCode.eq(parsed.system_code))
            .filter(component_code::Column::Code.eq(parsed.component_code))
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;

        let year = match parsed.year_code.parse::<i32>() {
            Ok(two_digit) => expand_year(two_digit),
            Err(_) => return Ok(None),
        };

        Ok(Some(Decoded {
            make: make_entry.make,
            model: model_entry
                .map(|m| m.model)
                .unwrap_or_else(|| format!("Unknown ({})", parsed.model_code)),
            year,
            system: system_entry
                .map(|s| s.name)
                .unwrap_or_else(|| format!("Unknown ({})", parsed.system_code)),
            component: component_entry
                .map(|c| c.name)
                .unwrap_or_else(|| format!("Unknown ({})", parsed.component_code)),
            position: parsed.position_code.map(|p| {
                POSITION_CODES
                    .get(p)
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| p.to_string())
            }),
        }))
    }

    pub async fn make_codes(&self) -> Result<Vec<make_code::Model>, ServiceError> {
        MakeCode::find()
            .order_by_asc(make_code::Column::Make)
            .all(&*self.db)
            .await
            .map_err(ServiceError::db_error)
    }

    pub async fn model_codes(
        &self,
        make: Option<&str>,
    ) -> Result<Vec<model_code::Model>, ServiceError> {
        let mut find = ModelCode::find().order_by_asc(model_code::Column::Model);
        if let Some(make) = make {
            find = find.filter(model_code::Column::Make.eq(make));
        }
        find.all(&*self.db).await.map_err(ServiceError::db_error)
    }

    pub async fn system_codes(&self) -> Result<Vec<system_code::Model>, ServiceError> {
        SystemCode::find()
            .order_by_asc(system_code::Column::Name)
            .all(&*self.db)
            .await
            .map_err(ServiceError::db_error)
    }

    pub async fn component_codes(
        &self,
        system: Option<&str>,
    ) -> Result<Vec<component_code::Model>, ServiceError> {
        let mut find = ComponentCode::find().order_by_asc(component_code::Column::Name);
        if let Some(system) = system {
            find = find.filter(component_code::Column::SystemCode.eq(system));
        }
        find.all(&*self.db).await.map_err(ServiceError::db_error)
    }

    /// Walks the candidate chain until a code unused within the make is
    /// found. The chain order is load-bearing: codes already issued
    /// under this scheme must keep resolving to the same models.
    async fn generate_model_code(&self, make: &str, model: &str) -> Result<String, ServiceError> {
        let clean = clean_model(model);

        for candidate in model_code_candidates(&clean) {
            let taken = ModelCode::find()
                .filter(model_code::Column::Make.eq(make))
                .filter(model_code::Column::Code.eq(&candidate))
                .one(&*self.db)
                .await
                .map_err(ServiceError::db_error)?;
            if taken.is_none() {
                return Ok(candidate);
            }
        }

        Err(ServiceError::ValidationError(format!(
            "Cannot generate unique model code for {} {}",
            make, model
        )))
    }

    /// Scans the catalog for the base SKU and its `-NNN` variants and
    /// appends the next sequence when the base is taken; the bare base
    /// counts as sequence 1.
    async fn with_sequence_suffix(&self, base_sku: String) -> Result<String, ServiceError> {
        let existing: Vec<String> = Part::find()
            .select_only()
            .column(part::Column::Sku)
            .filter(
                Condition::any()
                    .add(part::Column::Sku.eq(base_sku.clone()))
                    .add(part::Column::Sku.like(format!("{}-%", base_sku))),
            )
            .into_tuple()
            .all(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;

        if existing.is_empty() {
            return Ok(base_sku);
        }

        let seq_re = Regex::new(&format!(r"^{}-(\d{{3}})$", regex::escape(&base_sku)))
            .map_err(|e| ServiceError::InternalError(format!("sequence regex: {}", e)))?;

        let mut max_seq = 0u32;
        for sku in &existing {
            if *sku == base_sku {
                max_seq = max_seq.max(1);
            }
            if let Some(caps) = seq_re.captures(sku) {
                if let Ok(seq) = caps[1].parse::<u32>() {
                    max_seq = max_seq.max(seq);
                }
            }
        }

        // The LIKE scan also picks up longer SKUs that merely share the
        // prefix (a positioned variant of an unpositioned base). Those
        // do not claim the base itself.
        if max_seq == 0 {
            return Ok(base_sku);
        }

        Ok(format!("{}-{:03}", base_sku, max_seq + 1))
    }
}

/// Uppercases the model name and strips separators (hyphens, spaces,
/// slashes); digits stay, so "F-150" cleans to "F150".
fn clean_model(model: &str) -> String {
    model
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '/')
        .collect::<String>()
        .to_uppercase()
}

/// Candidate codes in fallback order: 3-char truncation padded with 'X',
/// then 2-char prefix plus each subsequent model character, then 2-char
/// prefix plus a digit 1-9.
fn model_code_candidates(clean: &str) -> Vec<String> {
    let chars: Vec<char> = clean.chars().collect();

    let mut primary: String = chars.iter().take(3).collect();
    while primary.chars().count() < 3 {
        primary.push('X');
    }

    let prefix: String = chars.iter().take(2).collect();
    let mut candidates = vec![primary];
    for c in chars.iter().skip(3) {
        candidates.push(format!("{}{}", prefix, c));
    }
    for n in 1..=9 {
        candidates.push(format!("{}{}", prefix, n));
    }
    candidates
}

fn parse_sku(sku: &str) -> Option<ParsedSku<'_>> {
    let mut segments: Vec<&str> = sku.split('-').collect();

    // A trailing 3-digit sequence suffix is a collision breaker, not part
    // of the identity; position codes are alphabetic so this is unambiguous.
    if segments.len() >= 5 {
        if let Some(last) = segments.last() {
            if last.len() == 3 && last.bytes().all(|b| b.is_ascii_digit()) {
                segments.pop();
            }
        }
    }

    if segments.len() < 4 || segments.len() > 5 {
        return None;
    }

    let sys_comp = segments[3];
    if sys_comp.len() != 4 || !sys_comp.is_ascii() {
        return None;
    }

    Some(ParsedSku {
        make_code: segments[0],
        model_code: segments[1],
        year_code: segments[2],
        system_code: &sys_comp[..2],
        component_code: &sys_comp[2..],
        position_code: segments.get(4).copied(),
    })
}

/// Two-digit years pivot at 50: 50..99 are 1900s, 00..49 are 2000s.
fn expand_year(two_digit: i32) -> i32 {
    if two_digit >= 50 {
        1900 + two_digit
    } else {
        2000 + two_digit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_model_strips_separators_only() {
        assert_eq!(clean_model("F-150"), "F150");
        assert_eq!(clean_model("Grand Cherokee"), "GRANDCHEROKEE");
        assert_eq!(clean_model("E/Z Go"), "EZGO");
    }

    #[test]
    fn candidates_start_with_padded_truncation() {
        let candidates = model_code_candidates("GT");
        assert_eq!(candidates[0], "GTX");

        let candidates = model_code_candidates("MUSTANG");
        assert_eq!(candidates[0], "MUS");
    }

    #[test]
    fn candidates_fall_back_to_prefix_plus_later_chars_then_digits() {
        let candidates = model_code_candidates("MUSTANG");
        // MUS, then MU+T, MU+A, MU+N, MU+G, then MU1..MU9.
        assert_eq!(
            &candidates[..5],
            &["MUS", "MUT", "MUA", "MUN", "MUG"].map(String::from)
        );
        assert_eq!(candidates[5], "MU1");
        assert_eq!(*candidates.last().unwrap(), "MU9");
    }

    #[test]
    fn parse_sku_accepts_four_or_five_segments() {
        assert!(parse_sku("FD-MUS-24-ENBL").is_some());
        assert!(parse_sku("FD-MUS-24-ENBL-LF").is_some());
        assert!(parse_sku("FD-MUS-24").is_none());
        assert!(parse_sku("FD-MUS-24-ENB").is_none());
        assert!(parse_sku("FD-MUS-24-ENBLX").is_none());
    }

    #[test]
    fn parse_sku_strips_sequence_suffix() {
        let parsed = parse_sku("FD-MUS-24-ENBL-002").unwrap();
        assert_eq!(parsed.position_code, None);

        let parsed = parse_sku("FD-MUS-24-ENBL-LF-002").unwrap();
        assert_eq!(parsed.position_code, Some("LF"));
    }

    #[test]
    fn parse_sku_splits_system_and_component() {
        let parsed = parse_sku("FD-MUS-24-ENBL-RF").unwrap();
        assert_eq!(parsed.system_code, "EN");
        assert_eq!(parsed.component_code, "BL");
        assert_eq!(parsed.position_code, Some("RF"));
    }

    #[test]
    fn year_pivot_expands_both_centuries() {
        assert_eq!(expand_year(99), 1999);
        assert_eq!(expand_year(50), 1950);
        assert_eq!(expand_year(49), 2049);
        assert_eq!(expand_year(0), 2000);
        assert_eq!(expand_year(24), 2024);
    }

    mod properties {
        use super::super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn clean_model_never_keeps_separators(model in ".{0,24}") {
                let clean = clean_model(&model);
                prop_assert!(!clean.contains('-'));
                prop_assert!(!clean.contains('/'));
                prop_assert!(!clean.chars().any(char::is_whitespace));
            }

            #[test]
            fn primary_candidate_is_always_three_chars(model in "[A-Za-z0-9]{1,12}") {
                let candidates = model_code_candidates(&clean_model(&model));
                prop_assert!(!candidates.is_empty());
                prop_assert_eq!(candidates[0].chars().count(), 3);
                for candidate in &candidates {
                    prop_assert!(candidate.chars().count() <= 3);
                }
            }

            #[test]
            fn year_round_trips_through_two_digits(year in 1950i32..=2049) {
                let code = format!("{:02}", year.rem_euclid(100));
                prop_assert_eq!(expand_year(code.parse::<i32>().unwrap()), year);
            }
        }
    }
}
