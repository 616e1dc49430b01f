//! The audience filter (spec.md §4.5): decides whether a given caller is in
//! a notification's or message's target audience.
//!
//! A `notification` target is disjunctive across nine rules — any single
//! match admits the caller. A `message` is scoped to exactly one user.

use prowhey_core::{CallerContext, TargetSet};

pub struct AudienceFilter;

impl AudienceFilter {
    /// True if `caller` is in `target`'s audience. Broadcast targets (every
    /// list empty, `non_registered` false) admit everyone.
    pub fn admits_notification(target: &TargetSet, caller: &CallerContext) -> bool {
        if target.is_broadcast() {
            return true;
        }
        let user_match = caller
            .user_id
            .as_deref()
            .map(|id| target.users.iter().any(|u| u == id))
            .unwrap_or(false);
        let group_match = target.groups.iter().any(|g| g == "all")
            || caller
                .user_groups
                .iter()
                .any(|g| target.groups.iter().any(|tg| tg == g));
        let region_match = target.regions.iter().any(|r| r == "all")
            || [
                caller.user_region.as_deref(),
                caller.user_province.as_deref(),
                caller.user_city.as_deref(),
            ]
            .into_iter()
            .flatten()
            .any(|r| target.regions.iter().any(|tr| tr == r));
        let province_match = caller
            .user_province
            .as_deref()
            .map(|p| target.provinces.iter().any(|tp| tp == p))
            .unwrap_or(false);
        let city_match = caller
            .user_city
            .as_deref()
            .map(|c| target.cities.iter().any(|tc| tc == c))
            .unwrap_or(false);
        let device_match = caller
            .user_device_id
            .as_deref()
            .map(|d| target.devices.iter().any(|td| td == d))
            .unwrap_or(false);
        let non_registered_match = target.non_registered && !caller.is_registered;

        user_match
            || group_match
            || region_match
            || province_match
            || city_match
            || device_match
            || non_registered_match
    }

    /// A message is visible only to the user it names.
    pub fn admits_message(message_user_id: &str, caller: &CallerContext) -> bool {
        caller.user_id.as_deref() == Some(message_user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller() -> CallerContext {
        CallerContext {
            user_id: Some("u-1".into()),
            user_groups: vec!["vip".into()],
            user_region: Some("Central".into()),
            user_province: Some("Riyadh".into()),
            user_city: Some("Riyadh".into()),
            user_device_id: Some("dev-1".into()),
            is_registered: true,
        }
    }

    #[test]
    fn broadcast_admits_everyone() {
        assert!(AudienceFilter::admits_notification(&TargetSet::default(), &caller()));
        assert!(AudienceFilter::admits_notification(
            &TargetSet::default(),
            &CallerContext::default()
        ));
    }

    #[test]
    fn each_scoping_dimension_independently_admits() {
        let cases = [
            TargetSet { users: vec!["u-1".into()], ..Default::default() },
            TargetSet { groups: vec!["vip".into()], ..Default::default() },
            TargetSet { regions: vec!["Central".into()], ..Default::default() },
            TargetSet { provinces: vec!["Riyadh".into()], ..Default::default() },
            TargetSet { cities: vec!["Riyadh".into()], ..Default::default() },
            TargetSet { devices: vec!["dev-1".into()], ..Default::default() },
        ];
        for target in cases {
            assert!(AudienceFilter::admits_notification(&target, &caller()));
        }
    }

    #[test]
    fn non_registered_flag_admits_only_unregistered_callers() {
        let target = TargetSet {
            non_registered: true,
            ..Default::default()
        };
        assert!(AudienceFilter::admits_notification(&target, &CallerContext::default()));
        assert!(!AudienceFilter::admits_notification(&target, &caller()));
    }

    #[test]
    fn scoped_target_rejects_unrelated_caller() {
        let target = TargetSet {
            users: vec!["someone-else".into()],
            ..Default::default()
        };
        assert!(!AudienceFilter::admits_notification(&target, &caller()));
    }

    #[test]
    fn message_is_visible_only_to_its_owner() {
        assert!(AudienceFilter::admits_message("u-1", &caller()));
        assert!(!AudienceFilter::admits_message("u-2", &caller()));
    }

    proptest::proptest! {
        #[test]
        fn any_matching_dimension_is_sufficient(
            matches_users in proptest::bool::ANY,
            matches_groups in proptest::bool::ANY,
        ) {
            let c = caller();
            let target = TargetSet {
                users: if matches_users { vec![c.user_id.clone().unwrap()] } else { vec!["nobody".into()] },
                groups: if matches_groups { c.user_groups.clone() } else { vec!["nobody".into()] },
                ..Default::default()
            };
            let admitted = AudienceFilter::admits_notification(&target, &c);
            proptest::prop_assert_eq!(admitted, matches_users || matches_groups);
        }
    }
}
