// ── Resource profiles ──
//
// One module per resource family. Each implements `Profile` for its kinds;
// the engine dispatches on `ConfigElement`.

pub(crate) mod anycast;
pub(crate) mod destination;
pub(crate) mod fabric_vlan;
pub(crate) mod itsm;
pub(crate) mod notification;
pub(crate) mod site;
pub(crate) mod virtual_network;

/// A desired value drifts when it is given and the controller disagrees.
/// Values the input leaves out never cause drift.
pub(crate) fn drifts<T: PartialEq + ?Sized>(desired: Option<&T>, observed: Option<&T>) -> bool {
    desired.is_some_and(|d| observed != Some(d))
}

/// Case-insensitive variant of [`drifts`] for controller enumerations.
pub(crate) fn drifts_ignore_case(desired: Option<&str>, observed: Option<&str>) -> bool {
    desired.is_some_and(|d| !observed.is_some_and(|o| o.eq_ignore_ascii_case(d)))
}

/// Whether every desired entry is present in `observed`.
pub(crate) fn is_subset(desired: &[String], observed: &[String]) -> bool {
    desired.iter().all(|d| observed.iter().any(|o| o == d))
}

/// Union of `observed` and `desired`, keeping observed order first.
pub(crate) fn union(observed: &[String], desired: &[String]) -> Vec<String> {
    let mut out = observed.to_vec();
    for d in desired {
        if !out.contains(d) {
            out.push(d.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn omitted_values_never_drift() {
        assert!(!drifts::<str>(None, Some("DATA")));
        assert!(drifts(Some("VOICE"), Some("DATA")));
        assert!(drifts(Some("VOICE"), None));
        assert!(!drifts_ignore_case(Some("data"), Some("DATA")));
    }

    #[test]
    fn subset_and_union() {
        let observed = vec!["a".to_owned(), "b".to_owned()];
        assert!(is_subset(&["b".to_owned()], &observed));
        assert!(!is_subset(&["c".to_owned()], &observed));
        assert_eq!(union(&observed, &["c".to_owned(), "a".to_owned()]), vec!["a", "b", "c"]);
    }
}
