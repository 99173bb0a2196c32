//! Notify Module
//!
//! Classifies FocusIn/FocusOut notifications by their mode and detail codes.
//! The server emits several notifications per real focus transfer (one per
//! window on the path between the old and new focus); only a few of those
//! combinations mean something to focus policy.

use x11rb::protocol::xproto::{NotifyDetail, NotifyMode};

/// Modes produced by pointer grabs, never real focus changes
fn is_grab_mode(mode: NotifyMode) -> bool {
    mode == NotifyMode::GRAB || mode == NotifyMode::UNGRAB
}

/// Should a focus notification on a client frame be ignored?
///
/// Accepts only `NotifyVirtual` and `NotifyNonlinearVirtual` details: the
/// frame is an ancestor of the window that actually received focus.
/// Codes outside the protocol enumeration are accepted.
pub fn should_ignore_focus(mode: NotifyMode, detail: NotifyDetail) -> bool {
    if is_grab_mode(mode) {
        return true;
    }

    detail == NotifyDetail::ANCESTOR
        || detail == NotifyDetail::INFERIOR
        || detail == NotifyDetail::NONLINEAR
        || detail == NotifyDetail::POINTER
        || detail == NotifyDetail::POINTER_ROOT
        || detail == NotifyDetail::NONE
}

/// Should a focus notification on the root window be ignored?
///
/// Accepts only `NotifyPointerRoot` and `NotifyNone` details, i.e. focus
/// was handed to the root itself rather than passing through it.
/// Codes outside the protocol enumeration are accepted.
pub fn should_ignore_root_focus(mode: NotifyMode, detail: NotifyDetail) -> bool {
    if is_grab_mode(mode) {
        return true;
    }

    detail == NotifyDetail::ANCESTOR
        || detail == NotifyDetail::INFERIOR
        || detail == NotifyDetail::VIRTUAL
        || detail == NotifyDetail::NONLINEAR
        || detail == NotifyDetail::NONLINEAR_VIRTUAL
        || detail == NotifyDetail::POINTER
}

/// Protocol name of a notify mode, for logging
pub fn mode_name(mode: NotifyMode) -> &'static str {
    match mode {
        NotifyMode::NORMAL => "NotifyNormal",
        NotifyMode::GRAB => "NotifyGrab",
        NotifyMode::UNGRAB => "NotifyUngrab",
        NotifyMode::WHILE_GRABBED => "NotifyWhileGrabbed",
        _ => "NotifyUnknownMode",
    }
}

/// Protocol name of a notify detail, for logging
pub fn detail_name(detail: NotifyDetail) -> &'static str {
    match detail {
        NotifyDetail::ANCESTOR => "NotifyAncestor",
        NotifyDetail::VIRTUAL => "NotifyVirtual",
        NotifyDetail::INFERIOR => "NotifyInferior",
        NotifyDetail::NONLINEAR => "NotifyNonlinear",
        NotifyDetail::NONLINEAR_VIRTUAL => "NotifyNonlinearVirtual",
        NotifyDetail::POINTER => "NotifyPointer",
        NotifyDetail::POINTER_ROOT => "NotifyPointerRoot",
        NotifyDetail::NONE => "NotifyNone",
        _ => "NotifyUnknownDetail",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODES: [NotifyMode; 4] = [
        NotifyMode::NORMAL,
        NotifyMode::GRAB,
        NotifyMode::UNGRAB,
        NotifyMode::WHILE_GRABBED,
    ];

    const DETAILS: [NotifyDetail; 8] = [
        NotifyDetail::ANCESTOR,
        NotifyDetail::VIRTUAL,
        NotifyDetail::INFERIOR,
        NotifyDetail::NONLINEAR,
        NotifyDetail::NONLINEAR_VIRTUAL,
        NotifyDetail::POINTER,
        NotifyDetail::POINTER_ROOT,
        NotifyDetail::NONE,
    ];

    fn accepted_mode(mode: NotifyMode) -> bool {
        mode == NotifyMode::NORMAL || mode == NotifyMode::WHILE_GRABBED
    }

    #[test]
    fn test_window_focus_table() {
        for mode in MODES {
            for detail in DETAILS {
                let accepted = accepted_mode(mode)
                    && (detail == NotifyDetail::VIRTUAL
                        || detail == NotifyDetail::NONLINEAR_VIRTUAL);
                assert_eq!(
                    should_ignore_focus(mode, detail),
                    !accepted,
                    "{} / {}",
                    mode_name(mode),
                    detail_name(detail)
                );
            }
        }
    }

    #[test]
    fn test_root_focus_table() {
        for mode in MODES {
            for detail in DETAILS {
                let accepted = accepted_mode(mode)
                    && (detail == NotifyDetail::POINTER_ROOT || detail == NotifyDetail::NONE);
                assert_eq!(
                    should_ignore_root_focus(mode, detail),
                    !accepted,
                    "{} / {}",
                    mode_name(mode),
                    detail_name(detail)
                );
            }
        }
    }

    #[test]
    fn test_policies_accept_disjoint_details() {
        for detail in DETAILS {
            let window = !should_ignore_focus(NotifyMode::NORMAL, detail);
            let root = !should_ignore_root_focus(NotifyMode::NORMAL, detail);
            assert!(!(window && root), "{} accepted by both", detail_name(detail));
        }
    }

    // Unrecognised codes fall through every exclusion set and are accepted.
    #[test]
    fn test_unknown_codes_are_accepted() {
        let unknown_detail = NotifyDetail::from(42u8);
        let unknown_mode = NotifyMode::from(9u8);

        assert!(!should_ignore_focus(NotifyMode::NORMAL, unknown_detail));
        assert!(!should_ignore_root_focus(NotifyMode::NORMAL, unknown_detail));
        assert!(!should_ignore_focus(unknown_mode, NotifyDetail::VIRTUAL));
        assert!(!should_ignore_root_focus(unknown_mode, NotifyDetail::NONE));

        // Grab modes still win over an unknown detail
        assert!(should_ignore_focus(NotifyMode::GRAB, unknown_detail));
        assert!(should_ignore_root_focus(NotifyMode::UNGRAB, unknown_detail));
    }

    #[test]
    fn test_names() {
        assert_eq!(mode_name(NotifyMode::WHILE_GRABBED), "NotifyWhileGrabbed");
        assert_eq!(detail_name(NotifyDetail::NONLINEAR_VIRTUAL), "NotifyNonlinearVirtual");
        assert_eq!(detail_name(NotifyDetail::from(200u8)), "NotifyUnknownDetail");
    }
}
