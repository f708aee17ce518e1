//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# cellmap window coordinator configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[channel]
# name = "cell_tower_channel"

[timing]
# grace_period_ms = 200    # 0-2000; delay before the first event to a new window

[placement]
# near_offset = 40         # offset from the map window when not using a secondary display
# beside_gap = 20          # gap to the right of the map window on fallback

# A [windows.<role>] table replaces all of that role's defaults.
# [windows.info]
# document = "tower-info.html"
# target = "tower_info_window"
# width = 600
# height = 700
#
# [windows.monitor]
# document = "monitor.html"
# target = "monitor_window"
# width = 800
# height = 600
#
# [windows.console]
# document = "console.html"
# target = "console_window"
# width = 900
# height = 520
"##
    .to_string()
}
