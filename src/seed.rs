//! Seed data for the SKU reference tables.
//!
//! Idempotent: rows already present are left alone, so this can run at
//! every bootstrap.

use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use tracing::info;

use crate::entities::{component_code, make_code, system_code};
use crate::errors::ServiceError;

const MAKE_CODES: &[(&str, &str)] = &[
    ("Ford", "FD"),
    ("Chevrolet", "CH"),
    ("GMC", "GM"),
    ("Dodge", "DG"),
    ("Ram", "RM"),
    ("Chrysler", "CR"),
    ("Jeep", "JP"),
    ("Lincoln", "LN"),
    ("Cadillac", "CD"),
    ("Buick", "BK"),
    ("Pontiac", "PN"),
    ("Saturn", "ST"),
    ("Oldsmobile", "OL"),
    ("Mercury", "MC"),
    ("Hummer", "HM"),
    ("Tesla", "TS"),
];

const SYSTEM_CODES: &[(&str, &str, &str)] = &[
    ("Engine", "EN", "Engine and engine components"),
    ("Transmission", "TR", "Transmission and drivetrain"),
    ("Steering", "ST", "Steering system components"),
    ("Brakes", "BR", "Brake system components"),
    ("Suspension", "SU", "Suspension system components"),
    ("Electrical", "EL", "Electrical system components"),
    ("Fuel/Air", "FA", "Fuel and air intake components"),
    ("Exhaust", "EX", "Exhaust system components"),
    ("Cooling", "CL", "Cooling system components"),
    ("Body", "BD", "Body panels and structural components"),
    ("Interior", "IN", "Interior components and trim"),
    ("Wheels/Tires", "WH", "Wheels, tires, and related components"),
];

const COMPONENT_CODES: &[(&str, &str, &str)] = &[
    // Engine (EN)
    ("EN", "Block", "BL"),
    ("EN", "Head", "HD"),
    ("EN", "Valve", "VL"),
    ("EN", "Piston", "PS"),
    ("EN", "Camshaft", "CM"),
    ("EN", "Crankshaft", "CR"),
    ("EN", "Oil Pump", "OL"),
    ("EN", "Water Pump", "WP"),
    ("EN", "Intake Manifold", "IN"),
    ("EN", "Throttle Body", "TH"),
    ("EN", "Turbocharger", "TB"),
    ("EN", "Supercharger", "SC"),
    ("EN", "Gasket", "GB"),
    ("EN", "Belt", "BT"),
    ("EN", "Timing Chain", "CH"),
    ("EN", "Motor Mount", "MO"),
    ("EN", "Sensor", "SE"),
    ("EN", "Spark Plug", "SP"),
    ("EN", "Ignition Coil", "IG"),
    ("EN", "Starter", "ST"),
    ("EN", "Alternator", "AL"),
    // Transmission (TR)
    ("TR", "Torque Converter", "TC"),
    ("TR", "Clutch", "CL"),
    ("TR", "Flywheel", "FW"),
    ("TR", "Shift Linkage", "SL"),
    ("TR", "Transfer Case", "TF"),
    ("TR", "Driveshaft", "DS"),
    ("TR", "CV Axle", "CV"),
    ("TR", "Differential", "DF"),
    ("TR", "Transmission Mount", "MO"),
    ("TR", "Valve Body", "VB"),
    ("TR", "Solenoid", "SO"),
    ("TR", "Filter", "FL"),
    ("TR", "Seal", "SE"),
    ("TR", "Gear Set", "GS"),
    ("TR", "U-Joint", "UJ"),
    // Steering (ST)
    ("ST", "Rack and Pinion", "RP"),
    ("ST", "Power Steering Pump", "PP"),
    ("ST", "Tie Rod", "TR"),
    ("ST", "Steering Column", "SC"),
    ("ST", "Steering Wheel", "SW"),
    ("ST", "Pitman Arm", "PA"),
    ("ST", "Idler Arm", "IA"),
    ("ST", "Center Link", "CL"),
    ("ST", "Steering Gear", "SG"),
    ("ST", "PS Hose", "PH"),
    ("ST", "PS Reservoir", "PR"),
    ("ST", "Steering Knuckle", "SK"),
    // Brakes (BR)
    ("BR", "Brake Pad", "PD"),
    ("BR", "Brake Rotor", "RT"),
    ("BR", "Brake Caliper", "CL"),
    ("BR", "Brake Drum", "DR"),
    ("BR", "Brake Shoe", "SH"),
    ("BR", "Master Cylinder", "MC"),
    ("BR", "Brake Booster", "BB"),
    ("BR", "Brake Line", "BL"),
    ("BR", "Brake Hose", "BH"),
    ("BR", "ABS Module", "AB"),
    ("BR", "Parking Brake", "PB"),
    ("BR", "Wheel Cylinder", "WC"),
    // Suspension (SU)
    ("SU", "Shock Absorber", "SH"),
    ("SU", "Strut", "ST"),
    ("SU", "Control Arm", "CA"),
    ("SU", "Ball Joint", "BJ"),
    ("SU", "Sway Bar Link", "SL"),
    ("SU", "Sway Bar", "SB"),
    ("SU", "Coil Spring", "CS"),
    ("SU", "Leaf Spring", "LS"),
    ("SU", "Strut Mount", "SM"),
    ("SU", "Bushing", "BU"),
    ("SU", "Torsion Bar", "TB"),
    ("SU", "Air Spring", "AS"),
    // Electrical (EL)
    ("EL", "Battery", "BT"),
    ("EL", "Fuse Box", "FB"),
    ("EL", "Wiring Harness", "WH"),
    ("EL", "Relay", "RL"),
    ("EL", "Switch", "SW"),
    ("EL", "ECU/PCM", "EC"),
    ("EL", "Headlight", "HL"),
    ("EL", "Tail Light", "TL"),
    ("EL", "Turn Signal", "TS"),
    ("EL", "Window Motor", "WM"),
    ("EL", "Door Lock Actuator", "DL"),
    ("EL", "Blower Motor", "BM"),
    // Fuel/Air (FA)
    ("FA", "Fuel Pump", "FP"),
    ("FA", "Fuel Injector", "FI"),
    ("FA", "Fuel Filter", "FF"),
    ("FA", "Fuel Tank", "FT"),
    ("FA", "Air Filter", "AF"),
    ("FA", "Air Box", "AB"),
    ("FA", "MAF Sensor", "MA"),
    ("FA", "O2 Sensor", "O2"),
    ("FA", "Fuel Rail", "FR"),
    ("FA", "Fuel Pressure Regulator", "PR"),
    ("FA", "PCV Valve", "PV"),
    ("FA", "EGR Valve", "EG"),
    // Exhaust (EX)
    ("EX", "Exhaust Manifold", "EM"),
    ("EX", "Catalytic Converter", "CC"),
    ("EX", "Muffler", "MF"),
    ("EX", "Resonator", "RS"),
    ("EX", "Exhaust Pipe", "EP"),
    ("EX", "Flex Pipe", "FP"),
    ("EX", "Exhaust Tip", "ET"),
    ("EX", "Oxygen Sensor", "OS"),
    ("EX", "Heat Shield", "HS"),
    ("EX", "Exhaust Gasket", "EG"),
    ("EX", "Downpipe", "DP"),
    ("EX", "EGR Pipe", "ER"),
    // Cooling (CL)
    ("CL", "Radiator", "RD"),
    ("CL", "Thermostat", "TH"),
    ("CL", "Water Pump", "WP"),
    ("CL", "Radiator Hose", "RH"),
    ("CL", "Coolant Reservoir", "CR"),
    ("CL", "Radiator Fan", "RF"),
    ("CL", "Fan Clutch", "FC"),
    ("CL", "Heater Core", "HC"),
    ("CL", "Oil Cooler", "OC"),
    ("CL", "Intercooler", "IC"),
    ("CL", "Coolant Temp Sensor", "CT"),
    ("CL", "Expansion Valve", "EV"),
    // Body (BD)
    ("BD", "Fender", "FN"),
    ("BD", "Hood", "HD"),
    ("BD", "Trunk Lid", "TL"),
    ("BD", "Door Shell", "DS"),
    ("BD", "Bumper Cover", "BC"),
    ("BD", "Grille", "GR"),
    ("BD", "Mirror", "MR"),
    ("BD", "Quarter Panel", "QP"),
    ("BD", "Rocker Panel", "RP"),
    ("BD", "Windshield", "WS"),
    ("BD", "Door Handle", "DH"),
    ("BD", "Tailgate", "TG"),
    // Interior (IN)
    ("IN", "Seat", "SE"),
    ("IN", "Dashboard", "DB"),
    ("IN", "Center Console", "CC"),
    ("IN", "Steering Wheel", "SW"),
    ("IN", "Carpet", "CP"),
    ("IN", "Headliner", "HL"),
    ("IN", "Door Panel", "DP"),
    ("IN", "Sun Visor", "SV"),
    ("IN", "Gauge Cluster", "GC"),
    ("IN", "Radio/Infotainment", "RD"),
    ("IN", "AC Controls", "AC"),
    ("IN", "Glove Box", "GB"),
    // Wheels/Tires (WH)
    ("WH", "Wheel/Rim", "WR"),
    ("WH", "Tire", "TR"),
    ("WH", "Wheel Bearing", "WB"),
    ("WH", "Hub Assembly", "HA"),
    ("WH", "Lug Nut", "LN"),
    ("WH", "Wheel Stud", "WS"),
    ("WH", "Center Cap", "CC"),
    ("WH", "Wheel Cover", "WC"),
    ("WH", "TPMS Sensor", "TP"),
    ("WH", "Valve Stem", "VS"),
    ("WH", "Wheel Spacer", "SP"),
    ("WH", "Wheel Lock", "WL"),
];

/// Seeds the make/system/component code tables.
pub async fn seed_sku_codes<C: ConnectionTrait>(conn: &C) -> Result<(), ServiceError> {
    for (make, code) in MAKE_CODES {
        let existing = make_code::Entity::find()
            .filter(make_code::Column::Code.eq(*code))
            .one(conn)
            .await
            .map_err(ServiceError::db_error)?;
        if existing.is_none() {
            make_code::ActiveModel {
                make: Set(make.to_string()),
                code: Set(code.to_string()),
                ..Default::default()
            }
            .insert(conn)
            .await
            .map_err(ServiceError::db_error)?;
        }
    }
    info!("Seeded {} make codes", MAKE_CODES.len());

    for (name, code, description) in SYSTEM_CODES {
        let existing = system_code::Entity::find()
            .filter(system_code::Column::Code.eq(*code))
            .one(conn)
            .await
            .map_err(ServiceError::db_error)?;
        if existing.is_none() {
            system_code::ActiveModel {
                code: Set(code.to_string()),
                name: Set(name.to_string()),
                description: Set(Some(description.to_string())),
                ..Default::default()
            }
            .insert(conn)
            .await
            .map_err(ServiceError::db_error)?;
        }
    }
    info!("Seeded {} system codes", SYSTEM_CODES.len());

    for (system, name, code) in COMPONENT_CODES {
        let existing = component_code::Entity::find()
            .filter(component_code::Column::SystemCode.eq(*system))
            .filter(component_code::Column::Code.eq(*code))
            .one(conn)
            .await
            .map_err(ServiceError::db_error)?;
        if existing.is_none() {
            component_code::ActiveModel {
                system_code: Set(system.to_string()),
                code: Set(code.to_string()),
                name: Set(name.to_string()),
                ..Default::default()
            }
            .insert(conn)
            .await
            .map_err(ServiceError::db_error)?;
        }
    }
    info!("Seeded {} component codes", COMPONENT_CODES.len());

    Ok(())
}
