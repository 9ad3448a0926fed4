#![warn(missing_docs)]
//! Module for additional uom macros that facilitate the creation of points, vecs or single unit values
/// helper macro to create the units
#[macro_export]
macro_rules! uom_unit_creator {
    ($unit:ident, $unit_type:ident, $val1:expr) => {
        $unit_type::new::<$unit>($val1)
    };
    ($unit:ident, $unit_type:ident, $val1:expr, $val2:expr) => {{
        use nalgebra::Point2;
        Point2::new(
            $unit_type::new::<$unit>($val1),
            $unit_type::new::<$unit>($val2),
        )
    }};
    ($unit:ident, $unit_type:ident, $( $x:expr ),*) => {
        {
            use std::vec::Vec;
            let mut temp_vec = Vec::new();
            $(
                temp_vec.push($unit_type::new::<$unit>($x));
            )*
            temp_vec
        }
    };
}

///macro to create a Length in meter
#[macro_export]
macro_rules! meter {
    ($( $x:expr ),*) =>{{
        use uom::si::{f64::Length, length::meter};
        $crate::uom_unit_creator![meter, Length, $( $x ),*]
    }};
}
///macro to create a Length in millimeter
#[macro_export]
macro_rules! millimeter {
    ($( $x:expr ),*) =>{{
        use uom::si::{f64::Length, length::millimeter};
        $crate::uom_unit_creator![millimeter, Length, $( $x ),*]
    }};
}
///macro to create a Length in micrometer
#[macro_export]
macro_rules! micrometer {
    ($( $x:expr ),*) =>{{
        use uom::si::{f64::Length, length::micrometer};
        $crate::uom_unit_creator![micrometer, Length, $( $x ),*]
    }};
}
///macro to create a Length in nanometer
#[macro_export]
macro_rules! nanometer {
    ($( $x:expr ),*) =>{{
        use uom::si::{f64::Length, length::nanometer};
        $crate::uom_unit_creator![nanometer, Length, $( $x ),*]
    }};
}
///macro to create an Angle in radian
#[macro_export]
macro_rules! radian {
    ($( $x:expr ),*) =>{{
        use uom::si::{f64::Angle, angle::radian};
        $crate::uom_unit_creator![radian, Angle, $( $x ),*]
    }};
}
///macro to create an Angle in degree
#[macro_export]
macro_rules! degree {
    ($( $x:expr ),*) =>{{
        use uom::si::{f64::Angle, angle::degree};
        $crate::uom_unit_creator![degree, Angle, $( $x ),*]
    }};
}
///macro to create a ThermodynamicTemperature in degree Celsius
#[macro_export]
macro_rules! celsius {
    ($( $x:expr ),*) =>{{
        use uom::si::{f64::ThermodynamicTemperature, thermodynamic_temperature::degree_celsius};
        $crate::uom_unit_creator![degree_celsius, ThermodynamicTemperature, $( $x ),*]
    }};
}

#[cfg(test)]
mod test {
    use nalgebra::Point2;
    use uom::si::{
        f64::{Angle, Length, ThermodynamicTemperature},
        length::millimeter,
        thermodynamic_temperature::degree_celsius,
    };
    #[test]
    fn single_value() {
        use approx::assert_relative_eq;
        assert_eq!(millimeter!(1.0), Length::new::<millimeter>(1.0));
        assert_eq!(meter!(0.001), Length::new::<millimeter>(1.0));
        // unit conversion rounds in the last bit, so compare with tolerance
        assert_relative_eq!(nanometer!(1000.0).value, micrometer!(1.0).value);
    }
    #[test]
    fn point2() {
        assert_eq!(
            millimeter!(1.0, 2.0),
            Point2::new(
                Length::new::<millimeter>(1.0),
                Length::new::<millimeter>(2.0)
            )
        );
    }
    #[test]
    fn angle() {
        use approx::assert_relative_eq;
        let a: Angle = degree!(180.0);
        assert_relative_eq!(a.value, std::f64::consts::PI);
        let r: Angle = radian!(1.0);
        assert_relative_eq!(r.value, 1.0);
    }
    #[test]
    fn temperature() {
        let t: ThermodynamicTemperature = celsius!(20.0);
        assert_eq!(t.get::<degree_celsius>(), 20.0);
    }
}
