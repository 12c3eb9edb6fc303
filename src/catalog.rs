// src/catalog.rs
//! Datastream GUIDs published by OEFA, grouped the way the API exposes them.

/// A named datastream within one area of the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dataset {
    pub slug: &'static str,
    pub id: &'static str,
}

const fn ds(slug: &'static str, id: &'static str) -> Dataset {
    Dataset { slug, id }
}

pub const DENUNCIAS: &str = "DENUN-SINAD-61293";
pub const PEDIDOS_FISCALIA: &str = "PEDID-FISCA-2019-61940";
pub const RESOLUCIONES_MULTA: &str = "RESOL-CON-MULTA-FIRME";
pub const INFORMES_SUPERVISION: &str = "INFOR-DE-LA-COORD-AGRIC";
pub const MEDIDAS_ADMINISTRATIVAS: &str = "MEDID-ADMIN-DE-LAS-DIREC";
pub const INFORMES_DIRECCION: &str = "INFOR-DE-LA-DIREC-28304";
pub const PROYECTOS_NORMATIVOS: &str = "PROYE-NORMA-OEFA";
pub const PROYECTOS_EXTERNOS: &str = "PROYE-NORMA-EXTER";
pub const ACTIVIDADES_AFA: &str = "ACTIV-AFA-36113";

pub const FISCALIZACION: &[Dataset] = &[
    ds("pedidos-fiscalia", PEDIDOS_FISCALIA),
    ds("denuncias", DENUNCIAS),
    ds("resoluciones-multa", RESOLUCIONES_MULTA),
    ds("expedientes", "EXPED-RESUE-15640"),
    ds("actos-administrativos", "REGIS-ACTOS-ADMIN-96376"),
    ds("resoluciones-directorales", "RESOL-DIREC-50309"),
    ds("resoluciones-subdirectorales", "RESOL-SUBDI"),
    ds("resoluciones-finales", "RESOL-FINAL-CON-MULT"),
];

pub const SUPERVISION: &[Dataset] = &[
    ds("informes", INFORMES_SUPERVISION),
    ds("medidas", MEDIDAS_ADMINISTRATIVAS),
    ds("informes-direccion", INFORMES_DIRECCION),
];

pub const POLITICAS: &[Dataset] = &[
    ds("proyectos-normativos", PROYECTOS_NORMATIVOS),
    ds("proyectos-normativos-recientes", "PROYE-NORMA-OEFA-64027"),
    ds("proyectos-externos", PROYECTOS_EXTERNOS),
    ds("proyectos-externos-recientes", "PROYE-NORMA-EXTER-65772"),
    ds("actividades-afa", ACTIVIDADES_AFA),
];

/// Top-level sections of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Area {
    Fiscalizacion,
    Supervision,
    Politicas,
}

impl Area {
    pub fn find(self, slug: &str) -> Option<Dataset> {
        let datasets = match self {
            Area::Fiscalizacion => FISCALIZACION,
            Area::Supervision => SUPERVISION,
            Area::Politicas => POLITICAS,
        };
        datasets.iter().copied().find(|d| d.slug == slug)
    }
}

/// Kind of environmental evaluation behind an indicator datastream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Indicator {
    /// Evaluación Ambiental Temprana
    Eat,
    /// Evaluación Ambiental de Seguimiento
    Eas,
    /// Impacto significativo
    Isim,
    /// Pasivos ambientales
    Ipash,
}

impl Indicator {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "eat" => Some(Indicator::Eat),
            "eas" => Some(Indicator::Eas),
            "isim" => Some(Indicator::Isim),
            "ipash" => Some(Indicator::Ipash),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Indicator::Eat => "EAT",
            Indicator::Eas => "EAS",
            Indicator::Isim => "ISIM",
            Indicator::Ipash => "IPASH",
        }
    }
}

/// Topical grouping of evaluation datastreams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Theme {
    Agua,
    Suelo,
    Aire,
    Biota,
    Ruido,
    Hidrobiologia,
    Sedimentos,
    FloraFauna,
}

/// Side datastream bundled with a theme, under `key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Related {
    pub key: &'static str,
    pub id: &'static str,
}

impl Theme {
    pub const ALL: [Theme; 8] = [
        Theme::Agua,
        Theme::Suelo,
        Theme::Aire,
        Theme::Biota,
        Theme::Ruido,
        Theme::Hidrobiologia,
        Theme::Sedimentos,
        Theme::FloraFauna,
    ];

    /// Accepts the path spellings used by the API, accents and case aside.
    pub fn parse(s: &str) -> Option<Self> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| match c {
                'á' => 'a',
                'é' => 'e',
                'í' => 'i',
                'ó' => 'o',
                'ú' => 'u',
                other => other,
            })
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
            .collect();
        match normalized.as_str() {
            "agua" => Some(Theme::Agua),
            "suelo" => Some(Theme::Suelo),
            "aire" => Some(Theme::Aire),
            "biota" => Some(Theme::Biota),
            "ruido" => Some(Theme::Ruido),
            "hidrobiologia" => Some(Theme::Hidrobiologia),
            "sedimento" | "sedimentos" => Some(Theme::Sedimentos),
            "florafauna" | "florayfauna" => Some(Theme::FloraFauna),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Theme::Agua => "agua",
            Theme::Suelo => "suelo",
            Theme::Aire => "aire",
            Theme::Biota => "biota",
            Theme::Ruido => "ruido",
            Theme::Hidrobiologia => "hidrobiologia",
            Theme::Sedimentos => "sedimento",
            Theme::FloraFauna => "floraFauna",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Theme::Agua => "Agua",
            Theme::Suelo => "Suelo",
            Theme::Aire => "Aire",
            Theme::Biota => "Biota",
            Theme::Ruido => "Ruido y Vibraciones",
            Theme::Hidrobiologia => "Hidrobiología",
            Theme::Sedimentos => "Sedimentos",
            Theme::FloraFauna => "Flora y Fauna",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Theme::Agua => "Datos integrados sobre calidad del agua y gestión ambiental.",
            Theme::Suelo => "Información consolidada sobre monitoreo y regulación del suelo.",
            Theme::Aire => "Indicadores y políticas sobre la calidad del aire y emisiones en el territorio nacional.",
            Theme::Biota => "Información sobre flora, fauna y ecosistemas afectados por actividades humanas.",
            Theme::Ruido => "Información sobre monitoreo ambiental de ruido y vibraciones en distintas zonas del país.",
            Theme::Hidrobiologia => "Evaluaciones sobre cuerpos de agua, ecosistemas acuáticos y biodiversidad hidrobiológica.",
            Theme::Sedimentos => "Datos sobre la calidad de sedimentos, acumulación de contaminantes y monitoreo ambiental.",
            Theme::FloraFauna => "Información sobre la biodiversidad y conservación de especies en el territorio nacional.",
        }
    }

    /// Evaluation datastreams of the theme, in presentation order.
    pub fn indicators(self) -> &'static [(Indicator, &'static str)] {
        use Indicator::*;
        match self {
            Theme::Agua => &[
                (Eat, "EAC-COMPO-AMBIE-AGUA"),
                (Eas, "EAS-COMPO-AMBIE-AGUA"),
                (Isim, "ISIM-COMPO-AMBIE-AGUA"),
                (Ipash, "IPASH-COMPO-AMBIE-AGUA"),
            ],
            Theme::Suelo => &[
                (Eat, "EAC-COMPO-AMBIE-SUELO"),
                (Eas, "EAS-COMPO-AMBIE-SUELO-18111"),
                (Isim, "ISIM-COMPO-AMBIE-SUELO"),
                (Ipash, "IPASH-COMPO-AMBIE-SUELO"),
            ],
            Theme::Aire => &[
                (Eat, "EAC-COMPO-AMBIE-AIRE"),
                (Eas, "EAS-COMPO-AMBIE-AIRE"),
                (Isim, "ISIM-COMPO-AMBIE-AIRE"),
            ],
            Theme::Biota => &[
                (Eat, "EAC-BIOTA"),
                (Eas, "EAS-FLORA-Y-FAUNA"),
                (Isim, "ISIM-HIDRO"),
                (Ipash, "IPASH-COMPO-AMBIE-BIOTA"),
            ],
            Theme::Ruido => &[(Eat, "EAC-RUIDO")],
            Theme::Hidrobiologia => &[
                (Eat, "EAC-COMPO-HIDRO"),
                (Eas, "EAS-COMPO-HIDRO"),
                (Isim, "ISIM-HIDRO"),
            ],
            Theme::Sedimentos => &[
                (Eat, "EAT-SEDIM"),
                (Isim, "ISIM-SEDIM"),
                (Ipash, "IPASH-SEDIM"),
            ],
            Theme::FloraFauna => &[(Eas, "EAS-FLORA-Y-FAUNA"), (Eat, "EAC-BIOTA")],
        }
    }

    pub fn indicator(self, indicator: Indicator) -> Option<&'static str> {
        self.indicators()
            .iter()
            .find(|(i, _)| *i == indicator)
            .map(|(_, id)| *id)
    }

    /// Complaint, supervision and policy datastreams shown next to the
    /// indicators.
    pub fn related(self) -> &'static [Related] {
        match self {
            Theme::Agua => &[
                Related { key: "denunciasRelacionadas", id: DENUNCIAS },
                Related { key: "normativas", id: PROYECTOS_NORMATIVOS },
            ],
            Theme::Suelo => &[
                Related { key: "supervision", id: INFORMES_SUPERVISION },
                Related { key: "politicas", id: PROYECTOS_EXTERNOS },
            ],
            Theme::Aire => &[
                Related { key: "supervision", id: INFORMES_DIRECCION },
                Related { key: "politicas", id: PROYECTOS_NORMATIVOS },
            ],
            Theme::Biota => &[
                Related { key: "denunciasRelacionadas", id: DENUNCIAS },
                Related { key: "politicas", id: PROYECTOS_NORMATIVOS },
            ],
            Theme::Ruido => &[
                Related { key: "supervision", id: INFORMES_SUPERVISION },
                Related { key: "politicas", id: PROYECTOS_NORMATIVOS },
            ],
            Theme::Hidrobiologia => &[
                Related { key: "denunciasRelacionadas", id: DENUNCIAS },
                Related { key: "politicas", id: PROYECTOS_EXTERNOS },
            ],
            Theme::Sedimentos => &[
                Related { key: "supervision", id: INFORMES_DIRECCION },
                Related { key: "politicas", id: PROYECTOS_NORMATIVOS },
            ],
            Theme::FloraFauna => &[
                Related { key: "denunciasRelacionadas", id: DENUNCIAS },
                Related { key: "politicas", id: PROYECTOS_EXTERNOS },
            ],
        }
    }
}
