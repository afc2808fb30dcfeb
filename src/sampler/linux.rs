// Linux-specific helpers: interface link state from /sys/class/net.

/// Read operstate for an interface (Linux). Unknown platforms and read
/// failures report `true` so selection still has candidates.
pub(super) fn interface_is_up(interface_name: &str) -> bool {
    #[cfg(target_os = "linux")]
    {
        let path = format!("/sys/class/net/{}/operstate", interface_name);
        if let Ok(content) = std::fs::read_to_string(&path) {
            let state = content.trim();
            // "unknown" covers virtual interfaces that never report a carrier.
            return state == "up" || state == "unknown";
        }
    }
    #[cfg(not(target_os = "linux"))]
    let _ = interface_name;
    true
}
