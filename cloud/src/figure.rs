//! Chart documents in the plotly figure layout (`data` traces + `layout`).
//! Any plotly front end can render them as is.

use serde::Serialize;

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum Axis {
    Time(Vec<String>),
    Numeric(Vec<f64>),
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Trace {
    pub x: Axis,
    pub y: Vec<f64>,
    pub mode: &'static str,
    pub name: String,
}

impl Trace {
    pub fn lines(name: impl Into<String>, x: Axis, y: Vec<f64>) -> Self {
        Self {
            x,
            y,
            mode: "lines",
            name: name.into(),
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Layout {
    pub title: String,
    pub xaxis_title: String,
    pub yaxis_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend_title: Option<String>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

#[test]
fn figure_serializes_like_plotly() {
    let figure = Figure {
        data: vec![Trace::lines(
            "Inlet",
            Axis::Time(vec!["2024-05-17 09:00:00".into()]),
            vec![21.5],
        )],
        layout: Layout {
            title: "Temperature Progression".into(),
            xaxis_title: "Time".into(),
            yaxis_title: "Temperature (°C)".into(),
            legend_title: None,
        },
    };

    assert_eq!(
        serde_json::to_value(&figure).unwrap(),
        serde_json::json!({
            "data": [{
                "x": ["2024-05-17 09:00:00"],
                "y": [21.5],
                "mode": "lines",
                "name": "Inlet",
            }],
            "layout": {
                "title": "Temperature Progression",
                "xaxis_title": "Time",
                "yaxis_title": "Temperature (°C)",
            },
        })
    );
}
