use crate::geo::haversine_km;
use crate::models::GeoPoint;
use crate::models::application::{Application, Priority};
use crate::models::employee::{Employee, SkillLevel};
use crate::models::matching::{Availability, EmployeeMatch};

const BASE_SCORE: u32 = 50;
const SERVICE_TYPE_BONUS: u32 = 30;
const TERRITORY_BONUS: u32 = 20;
const COMPETENCE_BONUS: u32 = 15;
const AVAILABILITY_BONUS: u32 = 10;
const PROXIMITY_BONUS: u32 = 10;
const PROXIMITY_RADIUS_KM: f64 = 10.0;
const MAX_SCORE: u32 = 100;

/// Ranks the whole roster against one application, highest score first.
/// The sort is stable, so tied candidates keep their roster order.
pub fn rank_candidates(
    application: &Application,
    site: Option<&GeoPoint>,
    roster: &[Employee],
) -> Vec<EmployeeMatch> {
    let mut matches: Vec<EmployeeMatch> = roster
        .iter()
        .map(|employee| score_candidate(application, site, employee))
        .collect();

    matches.sort_by(|a, b| b.score.cmp(&a.score));
    matches
}

pub fn score_candidate(
    application: &Application,
    site: Option<&GeoPoint>,
    employee: &Employee,
) -> EmployeeMatch {
    let mut score = BASE_SCORE;
    let mut reasons = Vec::new();

    if employee
        .service_types
        .iter()
        .any(|tag| tag == &application.service_type)
    {
        score += SERVICE_TYPE_BONUS;
        reasons.push("service type match".to_string());
    }

    if employee
        .territories
        .iter()
        .any(|tag| tag == &application.territory)
    {
        score += TERRITORY_BONUS;
        reasons.push("territory match".to_string());
    }

    if application.priority >= Priority::High && employee.skill_level == SkillLevel::Specialist {
        score += COMPETENCE_BONUS;
        reasons.push("high competence".to_string());
    }

    if employee.is_available() {
        score += AVAILABILITY_BONUS;
        reasons.push("available".to_string());
    }

    // No proximity bonus when either side has no known coordinates.
    let distance_km = match (employee.location.as_ref(), site) {
        (Some(from), Some(to)) => Some(haversine_km(from, to)),
        _ => None,
    };

    if distance_km.is_some_and(|km| km < PROXIMITY_RADIUS_KM) {
        score += PROXIMITY_BONUS;
        reasons.push("close to site".to_string());
    }

    EmployeeMatch {
        employee_id: employee.id,
        full_name: employee.full_name.clone(),
        score: score.min(MAX_SCORE),
        distance_km,
        availability: if employee.is_available() {
            Availability::Available
        } else {
            Availability::Busy
        },
        reasons,
    }
}
