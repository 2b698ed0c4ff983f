use serde::{Deserialize, Serialize};

/// Unit of measurement a stock item is counted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Pcs,
    Kg,
    M,
    M2,
    M3,
    Ltr,
    Box,
    Bag,
    Roll,
    Ton,
}

impl Unit {
    pub const ALL: [Unit; 10] = [
        Unit::Pcs,
        Unit::Kg,
        Unit::M,
        Unit::M2,
        Unit::M3,
        Unit::Ltr,
        Unit::Box,
        Unit::Bag,
        Unit::Roll,
        Unit::Ton,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Pcs => "pcs",
            Unit::Kg => "kg",
            Unit::M => "m",
            Unit::M2 => "m2",
            Unit::M3 => "m3",
            Unit::Ltr => "ltr",
            Unit::Box => "box",
            Unit::Bag => "bag",
            Unit::Roll => "roll",
            Unit::Ton => "ton",
        }
    }
}

impl std::str::FromStr for Unit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Unit::ALL
            .into_iter()
            .find(|unit| unit.as_str() == wanted)
            .ok_or_else(|| format!("unknown unit '{}'", s))
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Purpose a consumption is booked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActivityCode {
    Constr,
    Maint,
    Setup,
    Demo,
    Install,
    Repair,
    Test,
    Other,
}

impl ActivityCode {
    pub const ALL: [ActivityCode; 8] = [
        ActivityCode::Constr,
        ActivityCode::Maint,
        ActivityCode::Setup,
        ActivityCode::Demo,
        ActivityCode::Install,
        ActivityCode::Repair,
        ActivityCode::Test,
        ActivityCode::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityCode::Constr => "CONSTR",
            ActivityCode::Maint => "MAINT",
            ActivityCode::Setup => "SETUP",
            ActivityCode::Demo => "DEMO",
            ActivityCode::Install => "INSTALL",
            ActivityCode::Repair => "REPAIR",
            ActivityCode::Test => "TEST",
            ActivityCode::Other => "OTHER",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ActivityCode::Constr => "Construction",
            ActivityCode::Maint => "Maintenance",
            ActivityCode::Setup => "Setup",
            ActivityCode::Demo => "Demolition",
            ActivityCode::Install => "Installation",
            ActivityCode::Repair => "Repair",
            ActivityCode::Test => "Testing",
            ActivityCode::Other => "Other",
        }
    }
}

impl std::str::FromStr for ActivityCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_uppercase();
        ActivityCode::ALL
            .into_iter()
            .find(|code| code.as_str() == wanted)
            .ok_or_else(|| format!("unknown activity code '{}'", s))
    }
}

impl std::fmt::Display for ActivityCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
