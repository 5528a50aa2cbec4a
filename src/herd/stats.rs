//! Herd-wide aggregates, computed on demand from the current records.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use super::age::{age_in_years, age_months_at, role_label, round_to, RoleLabel};
use super::error::{HerdError, HerdResult};
use super::projection::parent_ids;
use super::store::HerdStore;
use crate::entities::animal::{self, Status};

/// Earliest birth year accepted by the growth cohort query.
pub const MIN_COHORT_YEAR: i32 = 1900;
/// Years before the current one included in the births series.
pub const BIRTHS_WINDOW_YEARS: i32 = 5;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Totals {
    pub total: u64,
    pub active: u64,
    pub archived: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RoleCounts {
    pub cow: u64,
    pub bull: u64,
    pub steer: u64,
    pub heifer: u64,
    pub calf: u64,
}

impl RoleCounts {
    fn add(&mut self, label: RoleLabel) {
        let slot = match label {
            RoleLabel::Cow => &mut self.cow,
            RoleLabel::Bull => &mut self.bull,
            RoleLabel::Steer => &mut self.steer,
            RoleLabel::Heifer => &mut self.heifer,
            RoleLabel::Calf => &mut self.calf,
        };
        *slot += 1;
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Summary {
    pub totals: Totals,
    #[serde(rename = "bySex")]
    pub by_sex: RoleCounts,
    /// Mean age in years of active animals with a known birth date.
    #[serde(rename = "avgAge")]
    pub avg_age: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DistributionEntry {
    pub key: String,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Distribution {
    pub total: u64,
    pub distribution: Vec<DistributionEntry>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct YearCount {
    pub year: i32,
    pub count: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CohortStatus {
    Ok,
    NoCattle,
    NoWeightData,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GrowthPoint {
    pub age_months: u32,
    pub avg_weight: f64,
    pub count: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GrowthCohort {
    pub year: i32,
    #[serde(rename = "cattleCount")]
    pub cattle_count: u64,
    pub status: CohortStatus,
    #[serde(rename = "growthData")]
    pub growth_data: Vec<GrowthPoint>,
}

pub async fn summary<S>(store: &S, today: NaiveDate) -> HerdResult<Summary>
where
    S: HerdStore + ?Sized,
{
    let herd = store.list_animals(None).await?;
    let parents = parent_ids(&herd);

    let mut totals = Totals::default();
    let mut by_sex = RoleCounts::default();
    let mut age_sum = 0.0;
    let mut aged = 0u32;

    for animal in &herd {
        totals.total += 1;
        match animal.status {
            Status::Archived => totals.archived += 1,
            Status::Active => {
                totals.active += 1;
                by_sex.add(role_label(animal, parents.contains(&animal.id), today));
                if let Some(dob) = animal.date_of_birth {
                    age_sum += age_in_years(dob, today);
                    aged += 1;
                }
            }
        }
    }

    let avg_age = (aged > 0).then(|| round_to(age_sum / f64::from(aged), 2));
    Ok(Summary {
        totals,
        by_sex,
        avg_age,
    })
}

fn known(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn distribution<F>(animals: &[animal::Model], field: F) -> Distribution
where
    F: Fn(&animal::Model) -> Option<&String>,
{
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for animal in animals {
        if let Some(key) = known(field(animal)) {
            *counts.entry(key).or_insert(0) += 1;
        }
    }

    let total: u64 = counts.values().sum();
    let mut distribution: Vec<DistributionEntry> = counts
        .into_iter()
        .map(|(key, count)| DistributionEntry {
            key: key.to_string(),
            count,
            percentage: round_to(count as f64 / total as f64 * 100.0, 1),
        })
        .collect();
    distribution.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));

    Distribution {
        total,
        distribution,
    }
}

/// Active animals grouped by color; animals with no recorded color are left out.
pub async fn color_distribution<S>(store: &S) -> HerdResult<Distribution>
where
    S: HerdStore + ?Sized,
{
    let active = store.list_animals(Some(Status::Active)).await?;
    Ok(distribution(&active, |a| a.color.as_ref()))
}

pub async fn breed_distribution<S>(store: &S) -> HerdResult<Distribution>
where
    S: HerdStore + ?Sized,
{
    let active = store.list_animals(Some(Status::Active)).await?;
    Ok(distribution(&active, |a| a.breed.as_ref()))
}

/// Dense births series for the current year and the five before it, oldest first.
pub async fn births_per_year<S>(store: &S, today: NaiveDate) -> HerdResult<Vec<YearCount>>
where
    S: HerdStore + ?Sized,
{
    let current = today.year();
    let mut years: BTreeMap<i32, u64> = (current - BIRTHS_WINDOW_YEARS..=current)
        .map(|year| (year, 0))
        .collect();

    for dob in store
        .list_animals(None)
        .await?
        .into_iter()
        .filter_map(|a| a.date_of_birth)
    {
        if let Some(count) = years.get_mut(&dob.year()) {
            *count += 1;
        }
    }

    Ok(years
        .into_iter()
        .map(|(year, count)| YearCount { year, count })
        .collect())
}

pub async fn growth_cohort<S>(store: &S, year: i32, today: NaiveDate) -> HerdResult<GrowthCohort>
where
    S: HerdStore + ?Sized,
{
    if year < MIN_COHORT_YEAR || year > today.year() {
        return Err(HerdError::Validation(format!(
            "Invalid year parameter: expected {}..={}",
            MIN_COHORT_YEAR,
            today.year()
        )));
    }

    let births: HashMap<i32, NaiveDate> = store
        .list_animals(None)
        .await?
        .into_iter()
        .filter_map(|a| a.date_of_birth.filter(|dob| dob.year() == year).map(|dob| (a.id, dob)))
        .collect();

    if births.is_empty() {
        return Ok(GrowthCohort {
            year,
            cattle_count: 0,
            status: CohortStatus::NoCattle,
            growth_data: Vec::new(),
        });
    }

    let ids: Vec<i32> = births.keys().copied().collect();
    let mut buckets: BTreeMap<u32, (f64, u64)> = BTreeMap::new();
    for log in store.weights_for_animals(&ids).await? {
        let Some(age_months) = births
            .get(&log.cattle_id)
            .and_then(|dob| age_months_at(*dob, log.measured_at))
        else {
            continue;
        };
        let bucket = buckets.entry(age_months).or_insert((0.0, 0));
        bucket.0 += log.weight_kg;
        bucket.1 += 1;
    }

    let growth_data: Vec<GrowthPoint> = buckets
        .into_iter()
        .map(|(age_months, (sum, count))| GrowthPoint {
            age_months,
            avg_weight: round_to(sum / count as f64, 1),
            count,
        })
        .collect();

    let status = if growth_data.is_empty() {
        CohortStatus::NoWeightData
    } else {
        CohortStatus::Ok
    };

    Ok(GrowthCohort {
        year,
        cattle_count: births.len() as u64,
        status,
        growth_data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::animal::Sex;
    use crate::herd::testing::{animal, date, weight, MemoryHerd};

    fn today() -> NaiveDate {
        date(2026, 10, 19)
    }

    fn colored(id: i32, color: Option<&str>, breed: Option<&str>) -> animal::Model {
        let mut a = animal(id, &format!("T{id}"), Sex::Female);
        a.color = color.map(str::to_string);
        a.breed = breed.map(str::to_string);
        a
    }

    fn born(id: i32, sex: Sex, dob: Option<NaiveDate>) -> animal::Model {
        let mut a = animal(id, &format!("T{id}"), sex);
        a.date_of_birth = dob;
        a
    }

    #[tokio::test]
    async fn summary_counts_statuses_and_roles() {
        let mut steer = born(3, Sex::Male, Some(date(2025, 3, 1)));
        steer.castrated = true;
        let mut archived = born(6, Sex::Female, Some(date(2019, 1, 1)));
        archived.status = Status::Archived;
        let mut calf = born(5, Sex::Male, Some(date(2026, 7, 1)));
        calf.mother_id = Some(7);

        let herd = vec![
            born(1, Sex::Female, Some(date(2022, 10, 19))),
            born(2, Sex::Male, Some(date(2021, 10, 19))),
            steer,
            born(4, Sex::Female, Some(date(2025, 9, 1))),
            calf,
            archived,
            born(7, Sex::Female, None),
        ];
        let store = MemoryHerd::new(herd);

        let result = summary(&store, today()).await.unwrap();
        assert_eq!(
            result.totals,
            Totals {
                total: 7,
                active: 6,
                archived: 1
            }
        );
        assert_eq!(
            result.by_sex,
            RoleCounts {
                cow: 2,
                bull: 1,
                steer: 1,
                heifer: 1,
                calf: 1
            }
        );
        assert!(result.avg_age.is_some());
    }

    #[tokio::test]
    async fn average_age_skips_unknown_birth_dates() {
        let herd = vec![
            born(1, Sex::Female, Some(date(2024, 10, 19))),
            born(2, Sex::Female, Some(date(2022, 10, 19))),
            born(3, Sex::Female, None),
        ];
        let result = summary(&MemoryHerd::new(herd), today()).await.unwrap();
        // 730 and 1461 days over 365.25
        assert_eq!(result.avg_age, Some(3.0));
    }

    #[tokio::test]
    async fn average_age_is_null_without_birth_dates() {
        let herd = vec![born(1, Sex::Female, None)];
        let result = summary(&MemoryHerd::new(herd), today()).await.unwrap();
        assert_eq!(result.avg_age, None);

        let empty = summary(&MemoryHerd::default(), today()).await.unwrap();
        assert_eq!(empty.totals, Totals::default());
        assert_eq!(empty.by_sex, RoleCounts::default());
    }

    #[tokio::test]
    async fn color_distribution_sorted_by_count() {
        let herd = vec![
            colored(1, Some("Black"), None),
            colored(2, Some("Red"), None),
            colored(3, Some("Black"), None),
            colored(4, Some("Brown"), None),
            colored(5, Some("Black"), None),
            colored(6, Some("Red"), None),
        ];
        let dist = color_distribution(&MemoryHerd::new(herd)).await.unwrap();

        assert_eq!(dist.total, 6);
        let keys: Vec<_> = dist.distribution.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["Black", "Red", "Brown"]);
        assert_eq!(dist.distribution[0].percentage, 50.0);
        assert_eq!(dist.distribution[1].percentage, 33.3);
        assert_eq!(dist.distribution[2].percentage, 16.7);

        let sum: f64 = dist.distribution.iter().map(|e| e.percentage).sum();
        assert!((sum - 100.0).abs() <= 0.1 * dist.distribution.len() as f64);
    }

    #[tokio::test]
    async fn distribution_ignores_unknown_values_and_archived() {
        let mut archived = colored(4, None, Some("Holstein"));
        archived.status = Status::Archived;
        let herd = vec![
            colored(1, None, Some("Angus")),
            colored(2, None, Some("  ")),
            colored(3, None, None),
            archived,
        ];
        let dist = breed_distribution(&MemoryHerd::new(herd)).await.unwrap();
        assert_eq!(dist.total, 1);
        assert_eq!(
            dist.distribution,
            vec![DistributionEntry {
                key: "Angus".into(),
                count: 1,
                percentage: 100.0
            }]
        );
    }

    #[tokio::test]
    async fn empty_distribution_is_valid() {
        let dist = color_distribution(&MemoryHerd::default()).await.unwrap();
        assert_eq!(dist.total, 0);
        assert!(dist.distribution.is_empty());
    }

    #[tokio::test]
    async fn births_series_is_dense_and_ascending() {
        let herd = vec![
            born(1, Sex::Female, Some(date(2026, 2, 1))),
            born(2, Sex::Female, Some(date(2026, 3, 1))),
            born(3, Sex::Male, Some(date(2023, 5, 5))),
            born(4, Sex::Male, Some(date(2019, 5, 5))),
            born(5, Sex::Male, None),
        ];
        let series = births_per_year(&MemoryHerd::new(herd), today()).await.unwrap();

        assert_eq!(series.len(), 6);
        assert_eq!(
            series.iter().map(|y| y.year).collect::<Vec<_>>(),
            vec![2021, 2022, 2023, 2024, 2025, 2026]
        );
        assert_eq!(
            series.iter().map(|y| y.count).collect::<Vec<_>>(),
            vec![0, 0, 1, 0, 0, 2]
        );

        let empty = births_per_year(&MemoryHerd::default(), today()).await.unwrap();
        assert_eq!(empty.len(), 6);
        assert!(empty.iter().all(|y| y.count == 0));
    }

    #[tokio::test]
    async fn growth_cohort_buckets_by_age_month() {
        let herd = vec![
            born(1, Sex::Female, Some(date(2025, 1, 1))),
            born(2, Sex::Male, Some(date(2025, 1, 1))),
            born(3, Sex::Male, Some(date(2024, 1, 1))),
        ];
        let weights = vec![
            weight(1, 1, date(2025, 1, 15), 40.0),
            weight(2, 2, date(2025, 1, 20), 45.0),
            weight(3, 1, date(2025, 3, 3), 80.0),
            weight(4, 3, date(2025, 3, 3), 300.0),
            weight(5, 2, date(2024, 12, 1), 10.0),
        ];
        let store = MemoryHerd::new(herd).with_weights(weights);

        let cohort = growth_cohort(&store, 2025, today()).await.unwrap();
        assert_eq!(cohort.cattle_count, 2);
        assert_eq!(cohort.status, CohortStatus::Ok);
        assert_eq!(
            cohort.growth_data,
            vec![
                GrowthPoint {
                    age_months: 0,
                    avg_weight: 42.5,
                    count: 2
                },
                GrowthPoint {
                    age_months: 2,
                    avg_weight: 80.0,
                    count: 1
                },
            ]
        );
    }

    #[tokio::test]
    async fn empty_cohort_differs_from_cohort_without_weights() {
        let store = MemoryHerd::new(vec![born(1, Sex::Female, Some(date(2025, 4, 1)))]);

        let none = growth_cohort(&store, 2024, today()).await.unwrap();
        assert_eq!(none.cattle_count, 0);
        assert_eq!(none.status, CohortStatus::NoCattle);
        assert!(none.growth_data.is_empty());

        let unweighed = growth_cohort(&store, 2025, today()).await.unwrap();
        assert_eq!(unweighed.cattle_count, 1);
        assert_eq!(unweighed.status, CohortStatus::NoWeightData);
        assert!(unweighed.growth_data.is_empty());
    }

    #[tokio::test]
    async fn growth_cohort_rejects_out_of_range_years() {
        let store = MemoryHerd::default();
        for year in [1899, 2027] {
            let err = growth_cohort(&store, year, today()).await.unwrap_err();
            assert!(matches!(err, HerdError::Validation(_)));
        }
    }

    #[tokio::test]
    async fn aggregates_fail_whole_on_storage_errors() {
        let store = MemoryHerd::broken();
        assert!(matches!(summary(&store, today()).await, Err(HerdError::Retrieval(_))));
        assert!(matches!(color_distribution(&store).await, Err(HerdError::Retrieval(_))));
        assert!(matches!(births_per_year(&store, today()).await, Err(HerdError::Retrieval(_))));
        assert!(matches!(
            growth_cohort(&store, 2025, today()).await,
            Err(HerdError::Retrieval(_))
        ));
    }

    #[test]
    fn cohort_document_uses_camel_case_keys() {
        let cohort = GrowthCohort {
            year: 2025,
            cattle_count: 0,
            status: CohortStatus::NoCattle,
            growth_data: Vec::new(),
        };
        let json = serde_json::to_value(&cohort).unwrap();
        assert_eq!(json["cattleCount"], 0);
        assert_eq!(json["status"], "no_cattle");
        assert!(json["growthData"].as_array().unwrap().is_empty());
    }
}
