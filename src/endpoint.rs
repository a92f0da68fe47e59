use std::fmt;

/// The fixed set of AQS Data Mart services this client knows how to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `/list/cbsas`
    MetroAreas,
    /// `/list/states`
    States,
    /// `/list/countiesByState`
    CountiesByState,
    /// `/list/sitesByCounty`
    SitesByCounty,
    /// `/list/classes`
    ParameterClasses,
    /// `/list/parametersByClass`
    ParametersByClass,
    /// `/annualData/byCBSA`
    AnnualByMetroArea,
    /// `/annualData/bySite`
    AnnualBySite,
    /// `/annualData/byCounty`
    AnnualByCounty,
    /// `/annualData/byState`
    AnnualByState,
    /// `/monitors/bySite`
    MonitorsBySite,
}

/// Groups endpoints by the kind of data they return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointFamily {
    ReferenceList,
    AnnualSummary,
    MonitorMetadata,
}

impl Endpoint {
    pub const ALL: [Endpoint; 11] = [
        Endpoint::MetroAreas,
        Endpoint::States,
        Endpoint::CountiesByState,
        Endpoint::SitesByCounty,
        Endpoint::ParameterClasses,
        Endpoint::ParametersByClass,
        Endpoint::AnnualByMetroArea,
        Endpoint::AnnualBySite,
        Endpoint::AnnualByCounty,
        Endpoint::AnnualByState,
        Endpoint::MonitorsBySite,
    ];

    /// Path relative to the service base URL.
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::MetroAreas => "/list/cbsas",
            Endpoint::States => "/list/states",
            Endpoint::CountiesByState => "/list/countiesByState",
            Endpoint::SitesByCounty => "/list/sitesByCounty",
            Endpoint::ParameterClasses => "/list/classes",
            Endpoint::ParametersByClass => "/list/parametersByClass",
            Endpoint::AnnualByMetroArea => "/annualData/byCBSA",
            Endpoint::AnnualBySite => "/annualData/bySite",
            Endpoint::AnnualByCounty => "/annualData/byCounty",
            Endpoint::AnnualByState => "/annualData/byState",
            Endpoint::MonitorsBySite => "/monitors/bySite",
        }
    }

    pub fn family(self) -> EndpointFamily {
        match self {
            Endpoint::MetroAreas
            | Endpoint::States
            | Endpoint::CountiesByState
            | Endpoint::SitesByCounty
            | Endpoint::ParameterClasses
            | Endpoint::ParametersByClass => EndpointFamily::ReferenceList,
            Endpoint::AnnualByMetroArea
            | Endpoint::AnnualBySite
            | Endpoint::AnnualByCounty
            | Endpoint::AnnualByState => EndpointFamily::AnnualSummary,
            Endpoint::MonitorsBySite => EndpointFamily::MonitorMetadata,
        }
    }

    /// Column renames applied to the returned table, as `(from, to)` pairs.
    ///
    /// Reference lists come back with a generic `value_represented` column whose meaning
    /// depends on the endpoint; data endpoints are returned untouched.
    pub fn renames(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Endpoint::MetroAreas => &[("value_represented", "cbsa_name")],
            Endpoint::States => &[("value_represented", "state_name")],
            Endpoint::CountiesByState => &[("value_represented", "county_name")],
            Endpoint::SitesByCounty => &[("value_represented", "site_name")],
            Endpoint::ParameterClasses => &[
                ("code", "class_name"),
                ("value_represented", "class_description"),
            ],
            Endpoint::ParametersByClass => &[("value_represented", "parameter_description")],
            _ => &[],
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}
