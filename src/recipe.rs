use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::Serialize;

use crate::error::ChartError;
use crate::ir::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Bar,
    HorizontalBar,
    GroupedBar,
    StackedBar,
    Line,
    Area,
    Scatter,
    Pie,
    Donut,
}

impl ChartKind {
    pub const ALL: [ChartKind; 9] = [
        ChartKind::Bar,
        ChartKind::HorizontalBar,
        ChartKind::GroupedBar,
        ChartKind::StackedBar,
        ChartKind::Line,
        ChartKind::Area,
        ChartKind::Scatter,
        ChartKind::Pie,
        ChartKind::Donut,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::HorizontalBar => "horizontal_bar",
            ChartKind::GroupedBar => "grouped_bar",
            ChartKind::StackedBar => "stacked_bar",
            ChartKind::Line => "line",
            ChartKind::Area => "area",
            ChartKind::Scatter => "scatter",
            ChartKind::Pie => "pie",
            ChartKind::Donut => "donut",
        }
    }

    pub fn recipe(self) -> Recipe {
        Recipe::for_kind(self)
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ChartKind {
    type Err = ChartError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let key: String = raw
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "bar" | "column" | "verticalbar" => Ok(ChartKind::Bar),
            "horizontalbar" | "hbar" => Ok(ChartKind::HorizontalBar),
            "groupedbar" | "clusteredbar" => Ok(ChartKind::GroupedBar),
            "stackedbar" => Ok(ChartKind::StackedBar),
            "line" => Ok(ChartKind::Line),
            "area" => Ok(ChartKind::Area),
            "scatter" | "bubble" => Ok(ChartKind::Scatter),
            "pie" => Ok(ChartKind::Pie),
            "donut" | "doughnut" => Ok(ChartKind::Donut),
            _ => Err(ChartError::UnknownChartKind(raw.to_string())),
        }
    }
}

/// Ways to make a label fit its slot, tried in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FitStrategy {
    Wrap,
    Shrink,
    Rotate,
    Truncate,
    Omit,
}

/// How a chart family is drawn, expressed as data.
#[derive(Debug, Clone)]
pub struct Recipe {
    pub kind: ChartKind,
    pub required_roles: &'static [Role],
    pub optional_roles: &'static [Role],
    pub category_range: Option<RangeInclusive<usize>>,
    pub group_range: Option<RangeInclusive<usize>>,
    pub show_axes: bool,
    pub show_gridlines: bool,
    pub show_legend: bool,
    pub show_data_labels: bool,
    pub category_label_fit: &'static [FitStrategy],
    pub data_label_fit: &'static [FitStrategy],
}

const X_Y: &[Role] = &[Role::X, Role::Y];
const X_Y_GROUP: &[Role] = &[Role::X, Role::Y, Role::Group];
const GROUP_ONLY: &[Role] = &[Role::Group];
const SCATTER_OPTIONAL: &[Role] = &[Role::Group, Role::Y2];
const NONE: &[Role] = &[];

const VERTICAL_CATEGORY_FIT: &[FitStrategy] = &[
    FitStrategy::Wrap,
    FitStrategy::Shrink,
    FitStrategy::Rotate,
    FitStrategy::Omit,
];
const HORIZONTAL_CATEGORY_FIT: &[FitStrategy] = &[
    FitStrategy::Wrap,
    FitStrategy::Shrink,
    FitStrategy::Truncate,
];
const AXIS_TICK_FIT: &[FitStrategy] = &[FitStrategy::Rotate, FitStrategy::Omit];
const DATA_LABEL_FIT: &[FitStrategy] = &[FitStrategy::Shrink, FitStrategy::Omit];

const CATEGORY_LIMIT: usize = 200;
const GROUPED_CATEGORY_LIMIT: usize = 100;
const GROUP_LIMIT: usize = 12;
const SLICE_LIMIT: usize = 24;

impl Recipe {
    pub fn for_kind(kind: ChartKind) -> Self {
        let base = Recipe {
            kind,
            required_roles: X_Y,
            optional_roles: NONE,
            category_range: None,
            group_range: None,
            show_axes: true,
            show_gridlines: true,
            show_legend: false,
            show_data_labels: false,
            category_label_fit: VERTICAL_CATEGORY_FIT,
            data_label_fit: DATA_LABEL_FIT,
        };
        match kind {
            ChartKind::Bar => Recipe {
                category_range: Some(1..=CATEGORY_LIMIT),
                show_data_labels: true,
                ..base
            },
            ChartKind::HorizontalBar => Recipe {
                category_range: Some(1..=CATEGORY_LIMIT),
                show_data_labels: true,
                category_label_fit: HORIZONTAL_CATEGORY_FIT,
                ..base
            },
            ChartKind::GroupedBar | ChartKind::StackedBar => Recipe {
                required_roles: X_Y_GROUP,
                category_range: Some(1..=GROUPED_CATEGORY_LIMIT),
                group_range: Some(1..=GROUP_LIMIT),
                show_legend: true,
                ..base
            },
            ChartKind::Line | ChartKind::Area => Recipe {
                optional_roles: GROUP_ONLY,
                group_range: Some(1..=GROUP_LIMIT),
                show_legend: true,
                category_label_fit: AXIS_TICK_FIT,
                ..base
            },
            ChartKind::Scatter => Recipe {
                optional_roles: SCATTER_OPTIONAL,
                group_range: Some(1..=GROUP_LIMIT),
                show_legend: true,
                category_label_fit: AXIS_TICK_FIT,
                ..base
            },
            ChartKind::Pie | ChartKind::Donut => Recipe {
                category_range: Some(1..=SLICE_LIMIT),
                show_axes: false,
                show_gridlines: false,
                show_legend: true,
                show_data_labels: true,
                ..base
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_kind_names_loosely() {
        assert_eq!("Horizontal-Bar".parse::<ChartKind>().ok(), Some(ChartKind::HorizontalBar));
        assert_eq!("stacked_bar".parse::<ChartKind>().ok(), Some(ChartKind::StackedBar));
        assert_eq!("doughnut".parse::<ChartKind>().ok(), Some(ChartKind::Donut));
        assert!("radar".parse::<ChartKind>().is_err());
    }

    #[test]
    fn names_round_trip_through_from_str() {
        for kind in ChartKind::ALL {
            assert_eq!(kind.name().parse::<ChartKind>().ok(), Some(kind));
        }
    }

    #[test]
    fn grouped_recipes_require_group_role() {
        assert!(ChartKind::GroupedBar.recipe().required_roles.contains(&Role::Group));
        assert!(!ChartKind::Line.recipe().required_roles.contains(&Role::Group));
        assert!(!ChartKind::Pie.recipe().show_axes);
    }
}
