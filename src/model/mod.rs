pub mod attendance;
pub mod department;
pub mod department_schedule;
pub mod employee;
pub mod schedule;
