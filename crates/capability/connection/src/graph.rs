//! 图表请求描述。

use domain::{ObjectId, RequestEnvelope};

/// 图表格式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFormat {
    Png,
    Svg,
}

impl GraphFormat {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "png" => Some(GraphFormat::Png),
            "svg" => Some(GraphFormat::Svg),
            _ => None,
        }
    }

    pub fn uri(self) -> &'static str {
        match self {
            GraphFormat::Png => "chart.png",
            GraphFormat::Svg => "chart.svg",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            GraphFormat::Png => "image/png",
            GraphFormat::Svg => "image/svg+xml",
        }
    }
}

/// 图表时间范围，对应服务端的 graphid。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphRange {
    Live = 0,
    Last48Hours = 1,
    Last30Days = 2,
    Last365Days = 3,
}

impl GraphRange {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(GraphRange::Live),
            1 => Some(GraphRange::Last48Hours),
            2 => Some(GraphRange::Last30Days),
            3 => Some(GraphRange::Last365Days),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphRequest {
    pub format: GraphFormat,
    pub sensor_id: ObjectId,
    pub range: GraphRange,
    pub width: u32,
    pub height: u32,
    pub theme: u8,
    pub base_font_size: u32,
    pub show_legend: u8,
}

impl GraphRequest {
    /// 转换为出站请求（鉴权参数由连接补上）。
    pub fn to_envelope(&self) -> RequestEnvelope {
        RequestEnvelope::new(self.format.uri())
            .param("type", "graph")
            .param("graphid", self.range.id())
            .param("width", self.width)
            .param("height", self.height)
            .param("theme", self.theme)
            .param("refreshable", "true")
            .param(
                "graphstyling",
                format!(
                    "showLegend='{}' baseFontSize='{}'",
                    self.show_legend, self.base_font_size
                ),
            )
            .param("id", self.sensor_id)
    }
}

/// 获取到的图表。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Graph {
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}
