//! Chart.js canvases for the dashboard

use serde_json::{Value, json};

#[derive(Debug, Clone, Copy)]
pub struct ChartColor {
    pub border: &'static str,
    pub fill: &'static str,
}

pub const TEMPERATURE: ChartColor = ChartColor {
    border: "#3b82f6",
    fill: "rgba(59, 130, 246, 0.1)",
};
pub const HUMIDITY: ChartColor = ChartColor {
    border: "#10b981",
    fill: "rgba(16, 185, 129, 0.1)",
};
pub const WIND: ChartColor = ChartColor {
    border: "#f59e0b",
    fill: "rgba(245, 158, 11, 0.1)",
};
pub const PRESSURE: ChartColor = ChartColor {
    border: "#8b5cf6",
    fill: "rgba(139, 92, 246, 0.1)",
};
pub const COMFORT: ChartColor = ChartColor {
    border: "#10b981",
    fill: "rgba(16, 185, 129, 0.7)",
};

/// A single-dataset chart bound to a canvas id
#[derive(Debug, Clone)]
pub struct Chart<'a> {
    pub canvas_id: &'a str,
    pub kind: ChartKind,
    pub label: &'a str,
    pub labels: &'a [String],
    /// Missing readings render as gaps
    pub values: Vec<Option<f64>>,
    pub color: ChartColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Line,
    Bar,
}

impl ChartKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Line => "line",
            Self::Bar => "bar",
        }
    }
}

impl Chart<'_> {
    #[must_use]
    pub fn config(&self) -> Value {
        let dataset = match self.kind {
            ChartKind::Line => json!({
                "label": self.label,
                "data": self.values,
                "borderColor": self.color.border,
                "backgroundColor": self.color.fill,
                "tension": 0.4,
                "fill": true,
                "pointRadius": 4,
                "pointHoverRadius": 6,
                "spanGaps": true,
            }),
            ChartKind::Bar => json!({
                "label": self.label,
                "data": self.values,
                "borderColor": self.color.border,
                "backgroundColor": self.color.fill,
                "borderWidth": 1,
            }),
        };

        json!({
            "type": self.kind.as_str(),
            "data": {
                "labels": self.labels,
                "datasets": [dataset],
            },
            "options": {
                "responsive": true,
                "interaction": { "mode": "index", "intersect": false },
                "plugins": {
                    "tooltip": {
                        "enabled": true,
                        "backgroundColor": "rgba(0, 0, 0, 0.8)",
                        "titleColor": "white",
                        "bodyColor": "white",
                        "padding": 10,
                        "displayColors": false,
                    },
                    "legend": { "display": false },
                },
                "scales": {
                    "y": { "beginAtZero": self.kind == ChartKind::Bar },
                },
            },
        })
    }

    /// Config serialized for embedding in an inline `<script>`
    #[must_use]
    pub fn script_config(&self) -> String {
        // "</" inside a script block would end it early
        self.config().to_string().replace("</", "<\\/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Vec<String> {
        vec!["00:00".to_string(), "03:00".to_string()]
    }

    #[test]
    fn test_line_config() {
        let labels = labels();
        let chart = Chart {
            canvas_id: "tempChart",
            kind: ChartKind::Line,
            label: "Temperature",
            labels: &labels,
            values: vec![Some(20.5), None],
            color: TEMPERATURE,
        };
        let config = chart.config();
        assert_eq!(config["type"], "line");
        assert_eq!(config["data"]["labels"][1], "03:00");
        assert_eq!(config["data"]["datasets"][0]["data"][0], 20.5);
        assert!(config["data"]["datasets"][0]["data"][1].is_null());
        assert_eq!(config["data"]["datasets"][0]["borderColor"], "#3b82f6");
    }

    #[test]
    fn test_script_config_cannot_close_script() {
        let labels = vec!["</script><b>".to_string()];
        let chart = Chart {
            canvas_id: "comfortChart",
            kind: ChartKind::Bar,
            label: "Comfort Index",
            labels: &labels,
            values: vec![Some(1.0)],
            color: COMFORT,
        };
        let script = chart.script_config();
        assert!(script.contains("\"type\":\"bar\""));
        assert!(script.contains("<\\/script>"));
        assert!(!script.contains("</script>"));
    }
}
