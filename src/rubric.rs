//! Debate formats and their scoring rubrics
//!
//! The set of formats is closed. Each one resolves once to a static
//! `FormatProfile` holding its phases, criteria, score scale and evaluation
//! mode.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebateFormat {
    /// Academic tournament format, scored per speaker
    Upct,
    /// RETOR format, scored per team
    Retor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMode {
    PerSpeaker,
    PerTeam,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreScale {
    pub min: u8,
    pub max: u8,
}

impl ScoreScale {
    pub fn contains(&self, score: u8) -> bool {
        (self.min..=self.max).contains(&score)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Criterion {
    pub id: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Phase {
    pub id: &'static str,
    pub name: &'static str,
    /// `None` when the tournament sets the time per debate
    pub time_limit_secs: Option<u32>,
    pub allows_questions: bool,
    pub allows_golden_minute: bool,
    /// No questions during the first minute
    pub protected_first_minute: bool,
    pub single_speaker: bool,
    pub criteria: Vec<Criterion>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormatProfile {
    pub format: DebateFormat,
    pub name: &'static str,
    pub phases: Vec<Phase>,
    pub stances: [&'static str; 2],
    pub scale: ScoreScale,
    pub evaluation_mode: EvaluationMode,
    /// Closing phase that scores the whole team rather than one intervention
    pub final_phase: Option<&'static str>,
}

impl FormatProfile {
    pub fn phase(&self, id: &str) -> Option<&Phase> {
        self.phases.iter().find(|p| p.id == id)
    }

    pub fn is_final_phase(&self, phase_id: &str) -> bool {
        self.final_phase == Some(phase_id)
    }

    /// Highest total a speaker or team can reach in one phase
    pub fn max_phase_total(&self, phase_id: &str) -> Option<u32> {
        self.phase(phase_id)
            .map(|p| p.criteria.len() as u32 * self.scale.max as u32)
    }
}

impl DebateFormat {
    pub const ALL: [DebateFormat; 2] = [DebateFormat::Upct, DebateFormat::Retor];

    pub fn id(&self) -> &'static str {
        match self {
            DebateFormat::Upct => "upct",
            DebateFormat::Retor => "retor",
        }
    }

    pub fn profile(&self) -> &'static FormatProfile {
        match self {
            DebateFormat::Upct => &UPCT,
            DebateFormat::Retor => &RETOR,
        }
    }
}

impl fmt::Display for DebateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for DebateFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "upct" => Ok(DebateFormat::Upct),
            "retor" => Ok(DebateFormat::Retor),
            other => Err(format!("Unknown debate format: {}", other)),
        }
    }
}

fn criteria(items: &[(&'static str, &'static str)]) -> Vec<Criterion> {
    items
        .iter()
        .map(|&(id, description)| Criterion { id, description })
        .collect()
}

struct PhaseRules {
    time_limit_secs: Option<u32>,
    allows_questions: bool,
    allows_golden_minute: bool,
    protected_first_minute: bool,
    single_speaker: bool,
}

const UPCT_SPEECH: PhaseRules = PhaseRules {
    time_limit_secs: None,
    allows_questions: true,
    allows_golden_minute: false,
    protected_first_minute: false,
    single_speaker: true,
};

const UPCT_CLOSING: PhaseRules = PhaseRules {
    allows_questions: false,
    ..UPCT_SPEECH
};

fn phase(id: &'static str, name: &'static str, rules: PhaseRules, criteria: Vec<Criterion>) -> Phase {
    Phase {
        id,
        name,
        time_limit_secs: rules.time_limit_secs,
        allows_questions: rules.allows_questions,
        allows_golden_minute: rules.allows_golden_minute,
        protected_first_minute: rules.protected_first_minute,
        single_speaker: rules.single_speaker,
        criteria,
    }
}

const OPENING: (&str, &str) = (
    "introduccion_llamativa",
    "Engaging opening and proper closing of the intervention",
);
const QUESTIONS: (&str, &str) = (
    "pertinencia_preguntas",
    "Relevance of questions and answers; 0 if none conceded when possible, 4 if the opponent asks none",
);
const EVIDENCE: (&str, &str) = (
    "verosimilitud_evidencias",
    "Critical and creative judgement of the evidence",
);
const REASONING: (&str, &str) = ("razonamiento_argumentacion", "Reasoning and argumentation");
const OPPONENTS: (&str, &str) = (
    "comprension_argumentos_oponentes",
    "Understanding of the opposing arguments",
);
const DELIVERY: (&str, &str) = (
    "comunicacion_eficacia_liderazgo",
    "Effective communication and leadership, voice and body language",
);
const LANGUAGE: (&str, &str) = ("uso_riqueza_lenguaje", "Use and richness of language");
const TIMING: (&str, &str) = (
    "ajuste_tiempo",
    "Keeps to the allotted time (penalized if more than 20s over or 10s short)",
);

static UPCT: Lazy<FormatProfile> = Lazy::new(|| FormatProfile {
    format: DebateFormat::Upct,
    name: "UPCT tournament",
    phases: vec![
        phase("introduccion", "Introduction", UPCT_SPEECH, criteria(&[
            OPENING,
            ("statu_quo_definiciones", "Presents the status quo and relevant definitions"),
            ("linea_argumental", "Presents the line of argument or an innovative solution"),
            QUESTIONS,
            EVIDENCE,
            REASONING,
            ("comprension_premisa_contraria", "Understands the opposing premise, rebutting or anticipating it"),
            DELIVERY,
            LANGUAGE,
            TIMING,
        ])),
        phase("refutacion_1", "First rebuttal", UPCT_SPEECH, criteria(&[
            OPENING,
            ("linea_argumental_solucion", "Develops the line of argument and the proposed solution"),
            ("refutacion_defensa", "Rebuts or anticipates rebuttal and defends"),
            QUESTIONS,
            EVIDENCE,
            REASONING,
            OPPONENTS,
            DELIVERY,
            LANGUAGE,
            TIMING,
        ])),
        phase("refutacion_2", "Second rebuttal", UPCT_SPEECH, criteria(&[
            OPENING,
            ("refutacion_puntos_choque", "Rebuts and defends, justifying the clash points"),
            ("reconstruccion_linea_argumental", "Rebuilds the line of argument or proposed solution"),
            QUESTIONS,
            EVIDENCE,
            REASONING,
            OPPONENTS,
            DELIVERY,
            LANGUAGE,
            TIMING,
        ])),
        phase("conclusion", "Conclusion", UPCT_CLOSING, criteria(&[
            OPENING,
            ("resumen_sin_info_nueva", "Summarizes without adding information"),
            ("puntos_acogida_choque", "Justifies agreement and clash points against its own line"),
            ("reivindicacion_postura", "Reasserts the team's thesis"),
            ("explicacion_exordio", "Explains the exordium or motto used by the team"),
            REASONING,
            OPPONENTS,
            DELIVERY,
            LANGUAGE,
            TIMING,
        ])),
        phase(
            "final",
            "Team evaluation",
            PhaseRules {
                single_speaker: false,
                ..UPCT_CLOSING
            },
            criteria(&[
                ("sumatorio_oradores", "Sum of the previous speakers"),
                ("estructuracion_conexion_equipo", "Structure and connection of the discourse across team members"),
                ("mejor_orador", "Selection of the best speaker"),
            ]),
        ),
    ],
    stances: ["for", "against"],
    scale: ScoreScale { min: 0, max: 4 },
    evaluation_mode: EvaluationMode::PerSpeaker,
    final_phase: Some("final"),
});

// Every RETOR phase is scored on the same five team criteria
const RETOR_CRITERIA: [(&str, &str); 5] = [
    (
        "comprension_mocion",
        "Understanding of the motion and of how the debate develops",
    ),
    ("relevancia_informacion", "Relevance and reliability of the information presented"),
    ("argumentacion_refutacion", "Argumentation and rebuttal of the opposing team"),
    ("oratoria_persuasion", "Oratory and persuasiveness"),
    ("trabajo_equipo", "Teamwork and use of the RETOR format"),
];

const RETOR_OPEN: PhaseRules = PhaseRules {
    time_limit_secs: None,
    allows_questions: true,
    allows_golden_minute: true,
    protected_first_minute: true,
    single_speaker: false,
};

static RETOR: Lazy<FormatProfile> = Lazy::new(|| FormatProfile {
    format: DebateFormat::Retor,
    name: "RETOR",
    phases: vec![
        phase(
            "contextualizacion",
            "Contextualization",
            PhaseRules { time_limit_secs: Some(360), ..RETOR_OPEN },
            criteria(&RETOR_CRITERIA),
        ),
        phase(
            "definicion",
            "Definition",
            PhaseRules { time_limit_secs: Some(120), ..RETOR_OPEN },
            criteria(&RETOR_CRITERIA),
        ),
        phase(
            "valoracion",
            "Assessment",
            PhaseRules {
                time_limit_secs: Some(300),
                protected_first_minute: false,
                ..RETOR_OPEN
            },
            criteria(&RETOR_CRITERIA),
        ),
        phase(
            "conclusion",
            "Conclusion",
            PhaseRules {
                time_limit_secs: Some(180),
                allows_questions: false,
                allows_golden_minute: false,
                protected_first_minute: false,
                single_speaker: true,
            },
            criteria(&RETOR_CRITERIA),
        ),
    ],
    stances: ["for", "against"],
    scale: ScoreScale { min: 1, max: 5 },
    evaluation_mode: EvaluationMode::PerTeam,
    final_phase: None,
});
